//! PNG-specific decode flags layered on top of the shared
//! [`jimg_core::options::DecoderOptions`].
use jimg_core::options::DecoderOptions;

/// Ancillary chunk bodies larger than this are rejected with
/// [`crate::error::PngError::Limit`] rather than grown without bound.
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Upper bound on an iCCP profile's declared size.
pub const MAX_ICCP_SIZE: usize = 8 * 1024 * 1024;

#[derive(Copy, Clone, Debug, Default)]
pub struct PngOptions {
    core: DecoderOptions,
    /// Skip iCCP decompression entirely.
    ignore_iccp: bool,
    /// Skip per-chunk CRC-32 validation.
    no_crc_check: bool,
}

impl PngOptions {
    pub fn new(core: DecoderOptions) -> Self {
        PngOptions { core, ignore_iccp: false, no_crc_check: false }
    }

    #[must_use]
    pub fn set_ignore_iccp(mut self, yes: bool) -> Self {
        self.ignore_iccp = yes;
        self
    }

    #[must_use]
    pub fn set_no_crc_check(mut self, yes: bool) -> Self {
        self.no_crc_check = yes;
        self
    }

    pub const fn core(&self) -> DecoderOptions {
        self.core
    }

    pub const fn ignore_iccp(&self) -> bool {
        self.ignore_iccp
    }

    pub const fn no_crc_check(&self) -> bool {
        self.no_crc_check
    }
}
