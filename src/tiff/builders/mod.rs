//! Stream writing building blocks
//!
//! The stream writer lays out chunks and directories; the EXIF module
//! builds and reconstructs the private EXIF and GPS directories.

pub mod exif;
pub mod writer;
