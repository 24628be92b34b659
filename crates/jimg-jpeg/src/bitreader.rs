//! C1 (pull-buffered byte reader, marker-aware) and C2 (bit reader with
//! marker-stuffing) for the JPEG core.
use alloc::vec::Vec;

use jimg_core::input::{InputError, InputSource, PullReader};

use crate::errors::{JpegError, JpegResult};
use crate::marker::Marker;

/// Wraps [`PullReader`] with JPEG's marker-scanning conventions: a run of
/// `0xFF` fill bytes preceding a marker collapses to that one marker, and
/// every multi-byte read goes through `ensure`/`consume` so the caller
/// never reads past what has actually been pulled from the input
/// callback.
pub struct JpegByteReader<S> {
    inner: PullReader<S>,
}

impl<S: InputSource> JpegByteReader<S> {
    pub fn new(source: S) -> Self {
        JpegByteReader {
            inner: PullReader::new(source),
        }
    }

    fn map_err(e: InputError) -> JpegError {
        match e {
            InputError::Eof => JpegError::BadData("unexpected end of input".into()),
            InputError::Io => JpegError::IoError,
        }
    }

    pub fn read_u8(&mut self) -> JpegResult<u8> {
        self.inner.read_u8().map_err(Self::map_err)
    }

    pub fn read_u16_be(&mut self) -> JpegResult<u16> {
        self.inner.read_u16_be().map_err(Self::map_err)
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> JpegResult<()> {
        self.inner.read_exact(out).map_err(Self::map_err)
    }

    pub fn read_vec(&mut self, n: usize) -> JpegResult<Vec<u8>> {
        let mut v = alloc::vec![0u8; n];
        self.read_exact(&mut v)?;
        Ok(v)
    }

    pub fn skip(&mut self, n: usize) -> JpegResult<()> {
        // Chunk skips so an over-long skip never starves `ensure` on a
        // source that can only deliver small reads at a time.
        let mut remaining = n;
        while remaining > 0 {
            let take = remaining.min(256);
            self.inner.skip(take).map_err(Self::map_err)?;
            remaining -= take;
        }
        Ok(())
    }

    pub fn peek(&mut self, n: usize) -> JpegResult<&[u8]> {
        self.inner.ensure(n).map_err(Self::map_err)?;
        Ok(self.inner.peek(n))
    }

    /// Scan for the next marker, collapsing a run of `0xFF` fill bytes
    /// into the one marker that terminates it. Returns the marker without
    /// consuming any bytes beyond it.
    pub fn read_marker(&mut self) -> JpegResult<Marker> {
        loop {
            let b = self.read_u8()?;
            if b != 0xFF {
                continue;
            }
            let mut low = self.read_u8()?;
            while low == 0xFF {
                low = self.read_u8()?;
            }
            if low == 0x00 {
                // Stuffed zero outside of entropy data shouldn't occur,
                // but guard against it rather than looping forever.
                continue;
            }
            return Ok(Marker::from_low_byte(low));
        }
    }

    /// Read the two-byte big-endian segment length and return the body
    /// length (length field minus the two length bytes themselves).
    pub fn read_segment_length(&mut self) -> JpegResult<u16> {
        self.read_u16_be()?
            .checked_sub(2)
            .ok_or(JpegError::BadData("segment length smaller than 2".into()))
    }
}

/// Number of 16-bit prefetch words the bit reader keeps topped up; a
/// fixed-size lookahead window rather than a literal ring buffer, sized
/// so a single refill always has enough bits on hand for the longest
/// Huffman code plus its extra bits.
const PREFETCH_WORDS: u32 = 16;

/// Word-sized bit accumulator fed from the byte stream, honoring JPEG's
/// `0xFF 0x00` stuffed-zero convention and entering "padded-zero" mode
/// once a real marker is seen mid-entropy-stream.
pub struct BitReader {
    acc: u64,
    bits_in_acc: u32,
    /// Credit of bits issued against bits actually fetched from the
    /// stream; goes negative once padded zeros start being handed out,
    /// signaling `overread()`.
    bbcread: i32,
    /// Set once a real (non-stuffed) marker byte has been seen; from
    /// then on refill hands out zero bits without consuming more input.
    hit_marker: bool,
    marker: Option<Marker>,
}

impl BitReader {
    pub fn new() -> Self {
        BitReader {
            acc: 0,
            bits_in_acc: 0,
            bbcread: 0,
            hit_marker: false,
            marker: None,
        }
    }

    /// Marker found mid-stream by `refill`, if any (a restart marker or
    /// EOI that terminates this scan's entropy data).
    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }

    pub fn reset(&mut self) {
        self.acc = 0;
        self.bits_in_acc = 0;
        self.bbcread = 0;
        self.hit_marker = false;
        self.marker = None;
    }

    /// Top up the accumulator to at least `PREFETCH_WORDS * 16` bits,
    /// reading two raw bytes at a time and handling `0xFF` stuffing.
    pub fn refill<S: InputSource>(&mut self, stream: &mut JpegByteReader<S>) -> JpegResult<()> {
        while self.bits_in_acc <= 64 - 16 {
            if self.hit_marker {
                // Padded-zero mode: feed zeros so trailing code positions
                // stay defined for the `overread` bounds check.
                self.acc <<= 16;
                self.bits_in_acc += 16;
                continue;
            }
            let mut word: u16 = 0;
            let mut got = 0u32;
            for _ in 0..2 {
                let b = stream.read_u8()?;
                if b == 0xFF {
                    let next = stream.read_u8()?;
                    if next == 0x00 {
                        // stuffed zero: drop it, keep only the 0xFF byte
                        word = (word << 8) | u16::from(b);
                        got += 8;
                        continue;
                    }
                    // real marker: stop refilling, remember it, enter
                    // padded-zero mode for the remainder of this scan.
                    self.hit_marker = true;
                    self.marker = Some(Marker::from_low_byte(next));
                    break;
                }
                word = (word << 8) | u16::from(b);
                got += 8;
            }
            if got == 0 {
                self.acc <<= 16;
                self.bits_in_acc += 16;
                continue;
            }
            if got < 16 {
                word <<= 16 - got;
            }
            self.acc = (self.acc << got) | u64::from(word >> (16 - got));
            self.bits_in_acc += got;
            self.bbcread += got as i32;
        }
        Ok(())
    }

    /// Return the top `n` bits of the accumulator without consuming them.
    pub fn get_bits(&self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        ((self.acc >> (self.bits_in_acc - n)) & ((1u64 << n) - 1)) as u32
    }

    pub fn drop_bits(&mut self, n: u32) {
        self.bits_in_acc -= n;
        self.bbcread -= n as i32;
    }

    /// Fetch and consume `n` bits in one step, refilling first if needed.
    pub fn read_bits<S: InputSource>(
        &mut self, stream: &mut JpegByteReader<S>, n: u32
    ) -> JpegResult<u32> {
        if self.bits_in_acc < n {
            self.refill(stream)?;
        }
        if self.bits_in_acc < n {
            // Still short after a refill attempt: padded-zero mode must
            // have kicked in already, so this is a legitimate (if
            // truncated) read, not a hard error.
            let got = self.get_bits(self.bits_in_acc);
            let short = n - self.bits_in_acc;
            self.drop_bits(self.bits_in_acc);
            return Ok(got << short);
        }
        let v = self.get_bits(n);
        self.drop_bits(n);
        Ok(v)
    }

    /// True once the bit credit has gone negative: the entropy stream was
    /// shorter than the code positions consumed from it.
    pub fn overread(&self) -> bool {
        self.bbcread < 0
    }
}

impl Default for BitReader {
    fn default() -> Self {
        Self::new()
    }
}
