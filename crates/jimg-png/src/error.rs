//! The PNG core's fatal-error taxonomy and warning bitfield, mirroring
//! `jimg-jpeg`'s `JpegError`/`JpegWarnings` split.
use alloc::string::String;
use core::fmt;

/// Fatal PNG decode errors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PngError {
    /// The public API was called out of its documented order.
    IncorrectUse(&'static str),
    /// The input callback returned a negative value.
    IoError,
    /// An internal allocation could not be satisfied, or a size
    /// computation would overflow.
    OutOfMemory(&'static str),
    /// A public call was made while the reader was in a state that
    /// doesn't support it.
    BadState(&'static str),
    /// The bitstream describes an image this decoder cannot represent.
    InvalidImage(String),
    /// A caller-configured or hard-coded limit was exceeded (dimension
    /// cap, `MAX_CHUNK_SIZE`).
    Limit(String),
    /// Malformed chunk data not covered by a more specific variant.
    BadData(String),
    /// The input doesn't begin with the 8-byte PNG signature, or the
    /// first chunk after it isn't IHDR.
    BadFile(&'static str),
    /// The DEFLATE/zlib stream assembled from IDAT (or iCCP) bodies
    /// failed to decompress.
    Deflate(String),
    /// A chunk's CRC-32 trailer didn't match the computed value:
    /// `(expected, computed)`.
    BadCrc(u32, u32),
    /// A required chunk (IHDR, a palette for an indexed image, at least
    /// one IDAT) was never seen.
    MissingChunk(&'static str),
    /// A chunk that must be unique appeared twice.
    DuplicatedChunk(&'static str),
    /// A chunk appeared out of the order the PNG spec requires (e.g.
    /// PLTE after IDAT, tRNS before PLTE for an indexed image, cHRM
    /// after PLTE for an indexed image).
    ChunkOrder(&'static str),
}

impl fmt::Display for PngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngError::IncorrectUse(s) => write!(f, "incorrect API use: {s}"),
            PngError::IoError => write!(f, "input callback reported an I/O error"),
            PngError::OutOfMemory(s) => write!(f, "out of memory: {s}"),
            PngError::BadState(s) => write!(f, "bad reader state: {s}"),
            PngError::InvalidImage(s) => write!(f, "invalid image: {s}"),
            PngError::Limit(s) => write!(f, "limit exceeded: {s}"),
            PngError::BadData(s) => write!(f, "bad data: {s}"),
            PngError::BadFile(s) => write!(f, "bad file: {s}"),
            PngError::Deflate(s) => write!(f, "deflate error: {s}"),
            PngError::BadCrc(expected, computed) => {
                write!(f, "bad chunk CRC: expected {expected:#010x}, computed {computed:#010x}")
            }
            PngError::MissingChunk(s) => write!(f, "missing required chunk: {s}"),
            PngError::DuplicatedChunk(s) => write!(f, "duplicated chunk: {s}"),
            PngError::ChunkOrder(s) => write!(f, "chunk order violation: {s}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}

/// Recoverable warnings, OR-accumulated across one decode session: none of
/// these abort the decode, but a nonzero bitfield downgrades the final
/// state to `DecodedWithWarnings`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct PngWarnings(u8);

impl PngWarnings {
    pub const BAD_GAMA: PngWarnings = PngWarnings(1 << 0);
    pub const BAD_SBIT: PngWarnings = PngWarnings(1 << 1);
    pub const BAD_ICCP: PngWarnings = PngWarnings(1 << 2);
    pub const BAD_PHYS: PngWarnings = PngWarnings(1 << 3);
    pub const BAD_SRGB: PngWarnings = PngWarnings(1 << 4);
    pub const BAD_CHRM: PngWarnings = PngWarnings(1 << 5);

    pub const fn empty() -> Self {
        PngWarnings(0)
    }

    pub fn insert(&mut self, other: PngWarnings) {
        self.0 |= other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: PngWarnings) -> bool {
        (self.0 & other.0) == other.0
    }
}

pub type PngResult<T> = Result<T, PngError>;