//! A whole-buffer zlib/DEFLATE decoder.
//!
//! `jimg-png`'s IDAT bridge (`crates/jimg-png/src/idat_bridge.rs`) adapts
//! this crate's single-shot API to a streaming "feed chunk bodies as they
//! arrive" contract. This crate itself only ever sees one fully assembled
//! buffer per call.

use alloc::vec::Vec;

use crate::bitstream::BitStreamReader;
use crate::constants::{
    fixed_dist_lengths, fixed_litlen_lengths, CODE_LENGTH_ORDER, DIST_BASE, DIST_EXTRA_BITS,
    LENGTH_BASE, LENGTH_EXTRA_BITS,
};
use crate::errors::DecodeErrorStatus;
use crate::huffman::HuffTable;

const BLOCKTYPE_STORED: u32 = 0;
const BLOCKTYPE_FIXED: u32 = 1;
const BLOCKTYPE_DYNAMIC: u32 = 2;

/// Tuning knobs for a single decode call.
#[derive(Copy, Clone, Debug)]
pub struct DeflateOptions {
    size_hint: usize,
    limit: usize,
    confirm_checksum: bool,
}

impl Default for DeflateOptions {
    fn default() -> Self {
        DeflateOptions {
            size_hint: 4096,
            limit: usize::MAX,
            confirm_checksum: true,
        }
    }
}

impl DeflateOptions {
    #[must_use]
    pub fn set_size_hint(mut self, size_hint: usize) -> Self {
        self.size_hint = size_hint;
        self
    }

    /// Caps decompressed output; exceeding it aborts with
    /// [`DecodeErrorStatus::OutputLimitExceeded`] rather than growing the
    /// buffer without bound on malformed/hostile input.
    #[must_use]
    pub fn set_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn set_confirm_checksum(mut self, yes: bool) -> Self {
        self.confirm_checksum = yes;
        self
    }
}

pub struct DeflateDecoder<'a> {
    data: &'a [u8],
    options: DeflateOptions,
}

impl<'a> DeflateDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_with_options(data, DeflateOptions::default())
    }

    pub fn new_with_options(data: &'a [u8], options: DeflateOptions) -> Self {
        DeflateDecoder { data, options }
    }

    /// Validate the 2-byte zlib header (RFC 1950 §2.2) and decode the
    /// DEFLATE stream that follows it, checking the trailing Adler-32
    /// unless [`DeflateOptions::set_confirm_checksum`] was set to `false`.
    pub fn decode_zlib(&mut self) -> Result<Vec<u8>, DecodeErrorStatus> {
        if self.data.len() < 2 + 4 {
            return Err(DecodeErrorStatus::InsufficientData);
        }
        let cmf = self.data[0];
        let flg = self.data[1];

        let cm = cmf & 0xF;
        let cinfo = cmf >> 4;
        let fdict = (flg >> 5) & 1;

        if cm != 8 || cinfo > 7 {
            return Err(DecodeErrorStatus::BadZlibHeader);
        }
        if fdict != 0 {
            return Err(DecodeErrorStatus::BadZlibHeader);
        }
        let check = (u16::from(cmf) * 256) + u16::from(flg);
        if check % 31 != 0 {
            return Err(DecodeErrorStatus::BadZlibHeader);
        }

        let out = self.decode_deflate_body(&self.data[2..])?;

        #[cfg(feature = "zlib")]
        if self.options.confirm_checksum {
            let trailer_start = self.data.len() - 4;
            let expected = u32::from_be_bytes([
                self.data[trailer_start],
                self.data[trailer_start + 1],
                self.data[trailer_start + 2],
                self.data[trailer_start + 3],
            ]);
            let found = simd_adler32::adler32(&out);
            if expected != found {
                return Err(DecodeErrorStatus::MismatchedAdler(expected, found));
            }
        }
        Ok(out)
    }

    /// Decode a raw DEFLATE stream with no zlib framing, for callers that
    /// already stripped or never had a zlib header.
    pub fn decode_deflate(&mut self) -> Result<Vec<u8>, DecodeErrorStatus> {
        self.decode_deflate_body(self.data)
    }

    fn decode_deflate_body(&self, body: &[u8]) -> Result<Vec<u8>, DecodeErrorStatus> {
        let mut reader = BitStreamReader::new(body);
        let mut out = Vec::with_capacity(self.options.size_hint);

        loop {
            let is_last = reader.bit()? == 1;
            let block_type = reader.bits(2)?;

            match block_type {
                BLOCKTYPE_STORED => self.decode_stored_block(&mut reader, &mut out)?,
                BLOCKTYPE_FIXED => {
                    let litlen = HuffTable::build(&fixed_litlen_lengths())?;
                    let dist = HuffTable::build(&fixed_dist_lengths())?;
                    self.decode_huffman_block(&mut reader, &litlen, &dist, &mut out)?;
                }
                BLOCKTYPE_DYNAMIC => {
                    let (litlen, dist) = self.read_dynamic_tables(&mut reader)?;
                    self.decode_huffman_block(&mut reader, &litlen, &dist, &mut out)?;
                }
                _ => return Err(DecodeErrorStatus::CorruptData),
            }

            if out.len() > self.options.limit {
                return Err(DecodeErrorStatus::OutputLimitExceeded(
                    self.options.limit,
                    out.len(),
                ));
            }
            if is_last {
                break;
            }
        }
        Ok(out)
    }

    fn decode_stored_block(
        &self, reader: &mut BitStreamReader, out: &mut Vec<u8>,
    ) -> Result<(), DecodeErrorStatus> {
        reader.align_to_byte();
        let header = reader.read_bytes(4)?;
        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);
        if len != !nlen {
            return Err(DecodeErrorStatus::CorruptData);
        }
        out.extend_from_slice(reader.read_bytes(usize::from(len))?);
        Ok(())
    }

    fn read_dynamic_tables(
        &self, reader: &mut BitStreamReader,
    ) -> Result<(HuffTable, HuffTable), DecodeErrorStatus> {
        let num_litlen = 257 + reader.bits(5)? as usize;
        let num_dist = 1 + reader.bits(5)? as usize;
        let num_code_len = 4 + reader.bits(4)? as usize;

        let mut code_len_lengths = [0u8; 19];
        for &slot in CODE_LENGTH_ORDER.iter().take(num_code_len) {
            code_len_lengths[slot] = reader.bits(3)? as u8;
        }
        let code_len_table = HuffTable::build(&code_len_lengths)?;

        let total = num_litlen + num_dist;
        let mut lengths = alloc::vec![0u8; total];
        let mut i = 0;
        while i < total {
            let sym = code_len_table.decode(reader)?;
            match sym {
                0..=15 => {
                    lengths[i] = sym as u8;
                    i += 1;
                }
                16 => {
                    if i == 0 {
                        return Err(DecodeErrorStatus::CorruptData);
                    }
                    let repeat = 3 + reader.bits(2)? as usize;
                    let prev = lengths[i - 1];
                    if i + repeat > total {
                        return Err(DecodeErrorStatus::CorruptData);
                    }
                    lengths[i..i + repeat].fill(prev);
                    i += repeat;
                }
                17 => {
                    let repeat = 3 + reader.bits(3)? as usize;
                    if i + repeat > total {
                        return Err(DecodeErrorStatus::CorruptData);
                    }
                    i += repeat;
                }
                18 => {
                    let repeat = 11 + reader.bits(7)? as usize;
                    if i + repeat > total {
                        return Err(DecodeErrorStatus::CorruptData);
                    }
                    i += repeat;
                }
                _ => return Err(DecodeErrorStatus::CorruptData),
            }
        }

        let litlen_table = HuffTable::build(&lengths[..num_litlen])?;
        let dist_table = HuffTable::build(&lengths[num_litlen..])?;
        Ok((litlen_table, dist_table))
    }

    fn decode_huffman_block(
        &self, reader: &mut BitStreamReader, litlen: &HuffTable, dist: &HuffTable,
        out: &mut Vec<u8>,
    ) -> Result<(), DecodeErrorStatus> {
        loop {
            let sym = litlen.decode(reader)?;
            if sym < 256 {
                out.push(sym as u8);
            } else if sym == 256 {
                return Ok(());
            } else {
                let len_idx = usize::from(sym - 257);
                if len_idx >= LENGTH_BASE.len() {
                    return Err(DecodeErrorStatus::CorruptData);
                }
                let extra = reader.bits(u32::from(LENGTH_EXTRA_BITS[len_idx]))?;
                let length = usize::from(LENGTH_BASE[len_idx]) + extra as usize;

                let dist_sym = dist.decode(reader)?;
                let dist_idx = usize::from(dist_sym);
                if dist_idx >= DIST_BASE.len() {
                    return Err(DecodeErrorStatus::CorruptData);
                }
                let dist_extra = reader.bits(u32::from(DIST_EXTRA_BITS[dist_idx]))?;
                let distance = usize::from(DIST_BASE[dist_idx]) + dist_extra as usize;

                if distance == 0 || distance > out.len() {
                    return Err(DecodeErrorStatus::CorruptData);
                }
                let start = out.len() - distance;
                for i in 0..length {
                    let byte = out[start + i];
                    out.push(byte);
                }
            }

            if out.len() > self.options.limit {
                return Err(DecodeErrorStatus::OutputLimitExceeded(
                    self.options.limit,
                    out.len(),
                ));
            }
        }
    }
}
