//! Canonical Huffman decode table, built straight from a code-length
//! vector the way every DEFLATE decoder since the RFC's own reference
//! decoder builds it: count codewords per length, derive each length's
//! starting code and starting index into a length-sorted symbol table,
//! then decode by pulling one bit at a time and comparing against the
//! running code/first/index triple.

use alloc::vec;
use alloc::vec::Vec;

use crate::bitstream::BitStreamReader;
use crate::constants::MAX_CODEWORD_LENGTH;
use crate::errors::DecodeErrorStatus;

pub struct HuffTable {
    counts: [u16; MAX_CODEWORD_LENGTH + 1],
    symbols: Vec<u16>,
}

impl HuffTable {
    /// Build from a per-symbol code length vector (`0` means "symbol
    /// unused"). Rejects over-subscribed codes; an under-subscribed
    /// (incomplete) code is accepted only when it has at most one used
    /// symbol, matching zlib's tolerance for a degenerate distance code in
    /// blocks with no matches.
    pub fn build(lengths: &[u8]) -> Result<Self, DecodeErrorStatus> {
        let mut counts = [0u16; MAX_CODEWORD_LENGTH + 1];
        for &len in lengths {
            if usize::from(len) > MAX_CODEWORD_LENGTH {
                return Err(DecodeErrorStatus::CorruptData);
            }
            counts[usize::from(len)] += 1;
        }
        counts[0] = 0;

        let mut left: i32 = 1;
        for len in 1..=MAX_CODEWORD_LENGTH {
            left <<= 1;
            left -= i32::from(counts[len]);
            if left < 0 {
                return Err(DecodeErrorStatus::CorruptData);
            }
        }

        let mut offsets = [0u16; MAX_CODEWORD_LENGTH + 2];
        for len in 1..=MAX_CODEWORD_LENGTH {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = vec![0u16; lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let idx = usize::from(offsets[usize::from(len)]);
                symbols[idx] = sym as u16;
                offsets[usize::from(len)] += 1;
            }
        }

        Ok(HuffTable { counts, symbols })
    }

    /// Decode one symbol, pulling bits one at a time from `reader`.
    pub fn decode(&self, reader: &mut BitStreamReader) -> Result<u16, DecodeErrorStatus> {
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for len in 1..=MAX_CODEWORD_LENGTH {
            code |= reader.bit()? as i32;
            let count = i32::from(self.counts[len]);
            if code - first < count {
                return Ok(self.symbols[(index + (code - first)) as usize]);
            }
            index += count;
            first += count;
            first <<= 1;
            code <<= 1;
        }
        Err(DecodeErrorStatus::CorruptData)
    }
}
