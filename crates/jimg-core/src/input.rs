//! A pull-based input callback and the buffered reader built on it.
//!
//! Both decoder cores read their bitstream exclusively through a caller
//! supplied callback of the shape
//!
//! ```text
//! read(buf, n, user) -> n_read | negative
//! ```
//!
//! `n_read == 0` means end of stream, a negative return means the caller's
//! underlying source failed. [`InputSource`] is the idiomatic Rust rendition
//! of that contract, and [`PullReader`] is the shared 4 KiB buffered reader
//! both cores build their segment/chunk parsers on top of.
use alloc::vec;
use alloc::vec::Vec;

/// Size of the internal refill buffer used by [`PullReader`].
pub const BUFFER_SIZE: usize = 4096;

/// A pull-based byte source.
///
/// Implementations write up to `buf.len()` bytes into `buf` and return the
/// number of bytes written. Returning `0` signals end of stream. Returning a
/// negative value signals an unrecoverable error from the underlying source
/// (a short read is not itself an error - the reader will call `pull` again
/// to top up the buffer).
pub trait InputSource {
    fn pull(&mut self, buf: &mut [u8]) -> isize;
}

/// Any `FnMut(&mut [u8]) -> isize` closure is a valid [`InputSource`].
impl<F> InputSource for F
where
    F: FnMut(&mut [u8]) -> isize,
{
    fn pull(&mut self, buf: &mut [u8]) -> isize {
        self(buf)
    }
}

/// A source that never yields anything, used by `reset()` to detach a
/// decoder from its previous input without requiring an `Option`.
pub struct NullSource;

impl InputSource for NullSource {
    fn pull(&mut self, _buf: &mut [u8]) -> isize {
        0
    }
}

/// Wraps an in-memory byte slice as an [`InputSource`]. A convenience
/// constructor for callers that already hold the whole file in memory,
/// alongside the streaming `Read`-based entry points.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }
}

impl<'a> InputSource for SliceSource<'a> {
    fn pull(&mut self, buf: &mut [u8]) -> isize {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n as isize
    }
}

/// Why [`PullReader::ensure`]/`consume` could not satisfy a request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputError {
    /// The source returned `0` (end of stream) before enough bytes were
    /// available.
    Eof,
    /// The source returned a negative value.
    Io,
}

/// A 4 KiB buffered reader over an [`InputSource`].
///
/// Implements the `ensure`/`consume`/`skip` primitives both decoder cores'
/// segment/chunk parsers are built from. Once the source reports EOF or an
/// I/O error, that state is sticky: further calls keep returning the same
/// error without calling `pull` again.
pub struct PullReader<S> {
    source: S,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    sticky: Option<InputError>,
    /// Total bytes handed out via `consume`/`skip`, used for diagnostics.
    pub consumed: u64,
}

impl<S: InputSource> PullReader<S> {
    pub fn new(source: S) -> Self {
        PullReader {
            source,
            buf: vec![0u8; BUFFER_SIZE],
            pos: 0,
            len: 0,
            sticky: None,
            consumed: 0,
        }
    }

    fn available(&self) -> usize {
        self.len - self.pos
    }

    /// Slide remaining bytes to the front and refill from the source until
    /// at least `n` bytes are buffered, `n` exceeds the buffer capacity
    /// (the buffer is grown to fit), or the source is exhausted/erroring.
    pub fn ensure(&mut self, n: usize) -> Result<(), InputError> {
        if self.available() >= n {
            return Ok(());
        }
        if let Some(e) = self.sticky {
            return Err(e);
        }
        if n > self.buf.len() {
            self.buf.resize(n, 0);
        }
        if self.pos != 0 {
            self.buf.copy_within(self.pos..self.len, 0);
            self.len -= self.pos;
            self.pos = 0;
        }
        while self.len < n {
            let read = self.source.pull(&mut self.buf[self.len..]);
            if read < 0 {
                self.sticky = Some(InputError::Io);
                return Err(InputError::Io);
            }
            if read == 0 {
                self.sticky = Some(InputError::Eof);
                return Err(InputError::Eof);
            }
            self.len += read as usize;
        }
        Ok(())
    }

    /// Returns a slice of the next `n` buffered bytes without consuming
    /// them. Caller must have called `ensure(n)` first.
    pub fn peek(&self, n: usize) -> &[u8] {
        &self.buf[self.pos..self.pos + n]
    }

    pub fn consume(&mut self, n: usize) -> &[u8] {
        let start = self.pos;
        self.pos += n;
        self.consumed += n as u64;
        &self.buf[start..start + n]
    }

    pub fn read_u8(&mut self) -> Result<u8, InputError> {
        self.ensure(1)?;
        Ok(self.consume(1)[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, InputError> {
        self.ensure(2)?;
        let b = self.consume(2);
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, InputError> {
        self.ensure(4)?;
        let b = self.consume(4);
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<(), InputError> {
        self.ensure(out.len())?;
        out.copy_from_slice(self.consume(out.len()));
        Ok(())
    }

    /// Skips `n` bytes without copying them out, pulling from the source in
    /// buffer-sized strides for spans larger than the internal buffer.
    pub fn skip(&mut self, mut n: usize) -> Result<(), InputError> {
        while n > 0 {
            if self.available() == 0 {
                self.ensure(1)?;
            }
            let take = self.available().min(n);
            self.consume(take);
            n -= take;
        }
        Ok(())
    }
}
