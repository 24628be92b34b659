//! The reader lifecycle both decoder cores drive through their public API.
//!
//! Transitions are one-way except for `reset`, which always returns a reader
//! to [`ReaderState::NotSet`]:
//!
//! ```text
//! NotSet -> Ready -> Decoding -> Decoded
//!                             -> DecodedWithWarnings
//!                             -> Aborted
//! ```
//!
//! `Ready` is entered once an input callback has been installed and the
//! bitstream header has been parsed far enough to populate `ImageInfo`.
//! `Decoding` is entered for the duration of a `decode_img`/`decode_pass`
//! call and is never observable by a caller between calls.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReaderState {
    /// No input has been bound yet, or the reader was just `reset`.
    NotSet,
    /// Header parsed, `ImageInfo` is valid, decoding has not started.
    Ready,
    /// A `decode_img`/`decode_pass` call is in progress.
    Decoding,
    /// Decoding finished with no recoverable errors.
    Decoded,
    /// Decoding finished but the decoder accumulated one or more
    /// recoverable warnings along the way.
    DecodedWithWarnings,
    /// Decoding hit a fatal error and the reader must be `reset` before
    /// reuse.
    Aborted,
}

impl Default for ReaderState {
    fn default() -> Self {
        ReaderState::NotSet
    }
}

impl ReaderState {
    /// Whether `decode_img`/`decode_pass` may be called from this state.
    pub const fn can_decode(self) -> bool {
        matches!(self, Self::Ready | Self::Decoded | Self::DecodedWithWarnings)
    }

    /// Whether the reader has reached a terminal state for this session.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Decoded | Self::DecodedWithWarnings | Self::Aborted)
    }
}
