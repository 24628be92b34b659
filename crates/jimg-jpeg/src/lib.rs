//! A streaming, pull-based JPEG (baseline and progressive) raster decoder.
//!
//! The public entry point is [`decoder::JpegReader`], which drives the
//! lifecycle: `create -> init_decoder ->
//! set_buffers -> decode_img | decode_pass*`. Input is supplied through a
//! [`jimg_core::InputSource`] pull callback rather than a borrowed buffer,
//! so the reader never needs the whole file resident in memory at once.
#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod bitreader;
pub mod color;
pub mod components;
pub mod decoder;
pub mod entropy;
pub mod errors;
pub mod headers;
pub mod huffman;
pub mod idct;
pub mod marker;
pub mod misc;
pub mod options;

pub use decoder::JpegReader;
pub use errors::{JpegError, JpegResult, JpegWarnings};
pub use options::JpegOptions;
