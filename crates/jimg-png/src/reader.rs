//! C1: thin wrapper over the shared [`jimg_core::input::PullReader`],
//! mapping its `InputError` into [`PngError`].
use alloc::vec::Vec;

use jimg_core::input::{InputError, InputSource, PullReader};

use crate::error::{PngError, PngResult};

pub struct PngByteReader<S> {
    inner: PullReader<S>,
}

impl<S: InputSource> PngByteReader<S> {
    pub fn new(source: S) -> Self {
        PngByteReader { inner: PullReader::new(source) }
    }

    fn map_err(e: InputError) -> PngError {
        match e {
            InputError::Eof => PngError::BadData("unexpected end of input".into()),
            InputError::Io => PngError::IoError,
        }
    }

    pub fn read_u8(&mut self) -> PngResult<u8> {
        self.inner.read_u8().map_err(Self::map_err)
    }

    pub fn read_u16_be(&mut self) -> PngResult<u16> {
        self.inner.read_u16_be().map_err(Self::map_err)
    }

    pub fn read_u32_be(&mut self) -> PngResult<u32> {
        self.inner.read_u32_be().map_err(Self::map_err)
    }

    pub fn read_exact(&mut self, out: &mut [u8]) -> PngResult<()> {
        self.inner.read_exact(out).map_err(Self::map_err)
    }

    pub fn read_vec(&mut self, n: usize) -> PngResult<Vec<u8>> {
        let mut v = alloc::vec![0u8; n];
        self.read_exact(&mut v)?;
        Ok(v)
    }

    pub fn skip(&mut self, n: usize) -> PngResult<()> {
        let mut remaining = n;
        while remaining > 0 {
            let take = remaining.min(4096);
            self.inner.skip(take).map_err(Self::map_err)?;
            remaining -= take;
        }
        Ok(())
    }

    /// True if at least one more byte is available past everything
    /// consumed so far; false on a clean end of stream. Used to check for
    /// trailing data after IEND under `strict_mode`.
    pub fn has_more(&mut self) -> PngResult<bool> {
        match self.inner.ensure(1) {
            Ok(()) => Ok(true),
            Err(InputError::Eof) => Ok(false),
            Err(InputError::Io) => Err(PngError::IoError),
        }
    }
}
