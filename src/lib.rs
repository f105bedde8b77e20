//! # lzwfuzz
//!
//! * `lzw` is byte-compatible with the classic Unix `compress(1)` `.Z` format
//! * `fuzzy` is a context-triggered piecewise (ssdeep-style) hashing engine and comparator
//!
//! The compression/expansion functions are generics that operate on trait objects
//! with bounds `Read + Write`. There are convenience functions for working
//! directly with buffers.
//!
//! ## File Example
//!
//! ```rs
//! use lzwfuzz::*;
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! let (in_size,out_size) = lzw::expand(&mut in_file,&mut out_file)
//!     .expect("expansion failed");
//! eprintln!("expanded {} into {}",in_size,out_size);
//! ```
//!
//! ## Buffer Example
//!
//! ```rs
//! use lzwfuzz::*;
//! let test_data = "This is the chaunt of the priests.  The chaunt of the priests of Mung.".as_bytes();
//! let compressed = lzw::compress_slice(test_data,&lzw::STD_OPTIONS).expect("compression failed");
//! ```

pub mod lzw;
pub mod fuzzy;

type DYNERR = Box<dyn std::error::Error>;

/// Errors shared by the `lzw` and `fuzzy` modules.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("bad magic number")]
    BadMagic,
    #[error("unsupported code width")]
    UnsupportedWidth,
    #[error("corrupt LZW code stream")]
    CorruptInput,
    #[error("input too large for fuzzy hash state")]
    Overflow,
    #[error("unparseable fuzzy signature")]
    BadSignature
}
