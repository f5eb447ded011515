//! Seekable stream traits
//!
//! The coder reads directories and chunks by seeking around the input,
//! and back-patches offsets in the output, so both directions need `Seek`.

use std::io::{Read, Seek, Write};

/// Trait for readers that can both read and seek
///
/// Combines the Read and Seek traits so the directory parser and the
/// chunk decoder can share one stream handle.
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can both write and seek
pub trait SeekableWriter: Write + Seek {}

impl<T: Write + Seek> SeekableWriter for T {}
