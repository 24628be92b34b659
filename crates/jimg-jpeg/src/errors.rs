//! The JPEG core's fatal-error taxonomy and warning bitfield.
//!
//! Fatal errors abort the reader (it transitions to
//! [`jimg_core::ReaderState::Aborted`] and must be `reset` before reuse).
//! Warnings are OR-accumulated in a [`JpegWarnings`] bitfield and never
//! abort decoding on their own; a nonzero bitfield at the end of a
//! successful decode downgrades the final state to `DecodedWithWarnings`.
use alloc::string::String;
use core::fmt;

/// Fatal JPEG decode errors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum JpegError {
    /// The public API was called out of its documented order
    /// (e.g. `decode_img` before `init_decoder`).
    IncorrectUse(&'static str),
    /// The input callback returned a negative value.
    IoError,
    /// An internal allocation could not be satisfied (size computation
    /// overflowed, or a caller-supplied limit was hit).
    OutOfMemory(&'static str),
    /// A public call was made while the reader was in a state that
    /// doesn't support it (e.g. `set_buffers` before `init_decoder`).
    BadState(&'static str),
    /// The bitstream describes an image this decoder cannot represent
    /// (too many components, sampling factors out of range, etc).
    InvalidImage(String),
    /// A caller-configured or hard-coded limit was exceeded (dimension
    /// cap, `JPG_MAXPASSES`, Huffman table size).
    Limit(String),
    /// Malformed segment data that isn't covered by a more specific
    /// variant below.
    BadData(String),
    /// The input doesn't begin with a valid SOI marker.
    BadFile(&'static str),
    /// A recognized-but-unimplemented SOF variant (SOF3/5/6/7/9+) or
    /// other out-of-scope bitstream feature.
    NotSupported(&'static str),
    /// Huffman table construction failed the Kraft-inequality check or
    /// exceeded `ENOUGH_DC`/`ENOUGH_AC`.
    BadHuffmanTable(String),
    /// A DHT/DQT table id was out of the `0..=3` range.
    TableId(String),
    /// A component referenced a DC/AC Huffman table id that was never
    /// defined by a DHT segment.
    NoHuffmanTable(String),
    /// A component referenced a quantization table id that was never
    /// defined by a DQT segment.
    NoQuantTable(String),
    /// The entropy decoder read a Huffman code that doesn't correspond
    /// to any table entry (should be unreachable given a valid table,
    /// but bounds the decode loop against corrupt input).
    BadCode(&'static str),
    /// A progressive scan's `(Ss, Se, Ah, Al)` parameters were
    /// self-inconsistent or inconsistent with a prior scan of the same
    /// component.
    InvalidPass(String),
    /// APP0 appeared after SOF, or other ordering violations severe
    /// enough to be fatal (SOF after SOS).
    SegmentOrder(&'static str),
    /// SOS was reached without ever seeing a SOF segment.
    NoSegment(&'static str),
    /// More than `JPG_MAXPASSES` progressive scans were seen.
    PassLimit,
}

impl fmt::Display for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JpegError::IncorrectUse(s) => write!(f, "incorrect API use: {s}"),
            JpegError::IoError => write!(f, "input callback reported an I/O error"),
            JpegError::OutOfMemory(s) => write!(f, "out of memory: {s}"),
            JpegError::BadState(s) => write!(f, "bad reader state: {s}"),
            JpegError::InvalidImage(s) => write!(f, "invalid image: {s}"),
            JpegError::Limit(s) => write!(f, "limit exceeded: {s}"),
            JpegError::BadData(s) => write!(f, "bad data: {s}"),
            JpegError::BadFile(s) => write!(f, "bad file: {s}"),
            JpegError::NotSupported(s) => write!(f, "not supported: {s}"),
            JpegError::BadHuffmanTable(s) => write!(f, "bad huffman table: {s}"),
            JpegError::TableId(s) => write!(f, "bad table id: {s}"),
            JpegError::NoHuffmanTable(s) => write!(f, "no huffman table: {s}"),
            JpegError::NoQuantTable(s) => write!(f, "no quant table: {s}"),
            JpegError::BadCode(s) => write!(f, "bad huffman code: {s}"),
            JpegError::InvalidPass(s) => write!(f, "invalid progressive pass: {s}"),
            JpegError::SegmentOrder(s) => write!(f, "segment order violation: {s}"),
            JpegError::NoSegment(s) => write!(f, "missing segment: {s}"),
            JpegError::PassLimit => write!(f, "progressive pass count exceeded JPG_MAXPASSES"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for JpegError {}

/// Recoverable warnings, OR-accumulated across one decode session.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct JpegWarnings(u8);

impl JpegWarnings {
    pub const BAD_SIGNATURE: JpegWarnings = JpegWarnings(1 << 0);
    pub const BAD_VERSION: JpegWarnings = JpegWarnings(1 << 1);
    pub const BAD_ICCP: JpegWarnings = JpegWarnings(1 << 2);
    pub const SEGMENT_ORDER: JpegWarnings = JpegWarnings(1 << 3);
    /// A block's entropy-coded data ran out before every coefficient
    /// position was filled (the bit reader's `overread()` went negative):
    /// the entropy stream was shorter than the scan actually needed.
    pub const TRUNCATED: JpegWarnings = JpegWarnings(1 << 4);

    pub const fn empty() -> Self {
        JpegWarnings(0)
    }

    pub fn insert(&mut self, other: JpegWarnings) {
        self.0 |= other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: JpegWarnings) -> bool {
        (self.0 & other.0) == other.0
    }
}

pub type JpegResult<T> = Result<T, JpegError>;
