//! IFD utilities
//!
//! Utilities for working with Image File Directories (IFDs) in TIFF files.

use log::debug;
use crate::io::seekable::SeekableReader;
use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::errors::{TiffError, TiffResult};

/// Reads the first IFD offset from a TIFF file header
///
/// # Arguments
/// * `reader` - The seekable reader to use
/// * `is_big_tiff` - Whether the file is in BigTIFF format
/// * `byte_order_handler` - Handler for the file's byte order
///
/// # Returns
/// The offset to the first IFD
pub fn read_first_ifd_offset(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    if is_big_tiff {
        debug!("Reading BigTIFF first IFD offset");
    } else {
        debug!("Reading standard TIFF first IFD offset");
    }
    read_offset(reader, is_big_tiff, byte_order_handler)
}

/// Reads one offset-sized value: 8 bytes for BigTIFF, 4 otherwise
pub fn read_offset(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    if is_big_tiff {
        byte_order_handler.read_u64(reader).map_err(TiffError::IoError)
    } else {
        byte_order_handler.read_u32(reader)
            .map(|v| v as u64)
            .map_err(TiffError::IoError)
    }
}

/// Reads a directory's entry count: 8 bytes for BigTIFF, 2 otherwise
pub fn read_entry_count(
    reader: &mut dyn SeekableReader,
    is_big_tiff: bool,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<u64> {
    if is_big_tiff {
        byte_order_handler.read_u64(reader).map_err(TiffError::IoError)
    } else {
        byte_order_handler.read_u16(reader)
            .map(|v| v as u64)
            .map_err(TiffError::IoError)
    }
}

/// Size of one directory entry in bytes
pub fn entry_size(is_big_tiff: bool) -> u64 {
    if is_big_tiff { 20 } else { 12 }
}

/// Calculates the size of an IFD in bytes
///
/// # Arguments
/// * `entry_count` - Number of entries in the directory
/// * `is_big_tiff` - Whether the file is in BigTIFF format
///
/// # Returns
/// The size of the IFD in bytes, including the count and next offset
pub fn calculate_ifd_size(entry_count: u64, is_big_tiff: bool) -> u64 {
    if is_big_tiff {
        // 8 (entry count) + 20 (each entry) + 8 (next IFD offset)
        8 + (20 * entry_count) + 8
    } else {
        // 2 (entry count) + 12 (each entry) + 4 (next IFD offset)
        2 + (12 * entry_count) + 4
    }
}
