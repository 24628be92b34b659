//! JPEG-specific decode flags layered on top of the shared
//! [`jimg_core::options::DecoderOptions`].
use jimg_core::options::DecoderOptions;

#[derive(Copy, Clone, Debug, Default)]
pub struct JpegOptions {
    core: DecoderOptions,
    /// Skip APP2 ICC profile assembly entirely.
    ignore_iccp: bool,
    /// Suppress the YCbCr->RGB color transform; samples are written out
    /// as their native (dequantized, IDCT'd) component values.
    keep_ycbcr: bool,
}

impl JpegOptions {
    pub fn new(core: DecoderOptions) -> Self {
        JpegOptions { core, ignore_iccp: false, keep_ycbcr: false }
    }

    #[must_use]
    pub fn set_ignore_iccp(mut self, yes: bool) -> Self {
        self.ignore_iccp = yes;
        self
    }

    #[must_use]
    pub fn set_keep_ycbcr(mut self, yes: bool) -> Self {
        self.keep_ycbcr = yes;
        self
    }

    pub const fn core(&self) -> DecoderOptions {
        self.core
    }

    pub const fn ignore_iccp(&self) -> bool {
        self.ignore_iccp
    }

    pub const fn keep_ycbcr(&self) -> bool {
        self.keep_ycbcr
    }
}
