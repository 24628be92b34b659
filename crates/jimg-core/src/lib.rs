//! Core routines shared by the jimg JPEG and PNG decoders.
//!
//! Both decoder cores are independent state machines that only share:
//!
//! - A common [`ImageInfo`](imageinfo::ImageInfo) record describing the
//!   decoded raster.
//! - A pull-based [`InputSource`](input::InputSource) callback contract and
//!   the buffered reader built on top of it.
//! - A common [`ReaderState`](state::ReaderState) lifecycle.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod bit_depth;
pub mod colorspace;
pub mod imageinfo;
pub mod input;
pub mod options;
pub mod state;

pub use imageinfo::ImageInfo;
pub use input::InputSource;
pub use state::ReaderState;
