//! A streaming, pull-based PNG raster decoder.
//!
//! The public entry point is [`decoder::PngReader`], which drives the
//! lifecycle `create -> init_decoder -> set_buffers -> decode_img |
//! decode_pass*`. Input is supplied through a [`jimg_core::InputSource`]
//! pull callback rather than a borrowed buffer, so the reader never needs
//! the whole file resident in memory at once (the exception being the
//! fully-inflated IDAT stream, buffered once in
//! [`idat_bridge::assemble_and_inflate`]).
//!
//! # Features
//! - `crc` (default) — CRC-32 validation of chunk bodies against their
//!   trailer; disabling this drops the checking code entirely, independent
//!   of the per-decode [`options::PngOptions::set_no_crc_check`] flag, which
//!   only skips *running* an already-compiled check.
//! - `std` (default) — enables `std::error::Error` impls for
//!   [`error::PngError`]; without it the crate is `no_std` + `alloc`.
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::op_ref, clippy::identity_op)]
extern crate alloc;

pub mod adam7;
pub mod crc;
pub mod decoder;
pub mod enums;
pub mod error;
pub mod filters;
pub mod headers;
pub mod idat_bridge;
pub mod materialize;
pub mod options;
pub mod reader;

pub use decoder::PngReader;
pub use enums::{FilterMethod, InterlaceMethod, PngColor};
pub use error::{PngError, PngResult, PngWarnings};
pub use options::PngOptions;
