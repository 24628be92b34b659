//! Options shared by the JPEG and PNG decoder cores.

/// Default ceiling on image dimensions, guards against a corrupt/malicious
/// header claiming an implausible width or height before any pixel buffer
/// has been sized against it.
pub const DEFAULT_MAX_DIMENSION: u32 = 1 << 20;

/// Options that influence how strictly a decoder core parses its
/// bitstream and how it reports recoverable problems.
///
/// Built with a chained-setter style: each `set_*` call takes `self` by
/// value and returns it, so options compose as `DecoderOptions::default()
/// .set_max_width(..).set_strict_mode(true)`.
#[derive(Copy, Clone, Debug)]
pub struct DecoderOptions {
    max_width: usize,
    max_height: usize,
    strict_mode: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            max_width: DEFAULT_MAX_DIMENSION as usize,
            max_height: DEFAULT_MAX_DIMENSION as usize,
            strict_mode: false,
        }
    }
}

impl DecoderOptions {
    pub fn new_fast() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    #[must_use]
    pub fn set_max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    /// When set, recoverable bitstream problems (e.g. a trailing garbage
    /// byte after `IEND`, an out-of-spec chunk ordering) abort the decode
    /// with a fatal error instead of being recorded as a warning.
    #[must_use]
    pub fn set_strict_mode(mut self, yes: bool) -> Self {
        self.strict_mode = yes;
        self
    }

    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    pub const fn max_height(&self) -> usize {
        self.max_height
    }

    pub const fn strict_mode(&self) -> bool {
        self.strict_mode
    }
}
