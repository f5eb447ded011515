//! TIFF container module
//!
//! This module provides the structures and functions for reading and
//! writing the TIFF and BigTIFF container: headers, directory chains,
//! tag values and the warnings raised while parsing them.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod tag_store;
pub mod warnings;
pub mod builder;
pub mod builders;
pub mod constants;
pub(crate) mod validation;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use builder::DirectoryBuilder;
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::{TiffReader, TiffReaderBuilder};
pub use tag_store::TagStore;
pub use types::{TagValue, TIFF};
pub use warnings::{Warning, WarningContext, WarningPolicy};
pub use crate::utils::format_utils::is_tiff;
