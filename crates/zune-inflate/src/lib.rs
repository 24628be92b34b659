//! A DEFLATE/zlib decompressor (RFC 1950/1951), used by `jimg-png` to
//! inflate the concatenated IDAT stream and any compressed iCCP chunk.
//! This crate is a dependency, not one of the two decoder cores.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use crate::decoder::{DeflateDecoder, DeflateOptions};
pub use crate::errors::DecodeErrorStatus;

mod bitstream;
mod constants;
mod decoder;
pub mod errors;
mod huffman;
