use core::fmt::{Debug, Formatter};

/// Why a DEFLATE/zlib decode failed.
pub enum DecodeErrorStatus {
    /// The source ran out before a complete block/stream could be read.
    InsufficientData,
    /// A Huffman code, block-type tag, or stored-block length check failed.
    CorruptData,
    /// The 2-byte zlib header failed `cm == 8 && cinfo <= 7 && fcheck % 31
    /// == 0 && fdict == 0`.
    BadZlibHeader,
    /// Decompressed output exceeded the caller's configured limit:
    /// `(limit, produced_so_far)`.
    OutputLimitExceeded(usize, usize),
    /// The trailing Adler-32 did not match the decompressed bytes:
    /// `(expected, computed)`.
    MismatchedAdler(u32, u32),
}

impl Debug for DecodeErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientData => write!(f, "insufficient data for deflate stream"),
            Self::CorruptData => write!(f, "corrupt deflate data"),
            Self::BadZlibHeader => write!(f, "bad zlib header"),
            Self::OutputLimitExceeded(limit, produced) => write!(
                f,
                "output limit exceeded: limit {limit}, produced {produced}"
            ),
            Self::MismatchedAdler(expected, found) => {
                write!(f, "mismatched adler32: expected {expected}, found {found}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeErrorStatus {}

/// Alias kept for the PNG bridge; the zlib wrapper is the only entry point
/// this workspace uses.
pub type ZlibDecodeErrors = DecodeErrorStatus;
