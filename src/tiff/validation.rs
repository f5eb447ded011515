//! TIFF validation utilities
//!
//! Validation functions that keep malformed or hostile streams from
//! driving the reader out of bounds or into huge allocations.

use log::{debug, error, warn};
use std::io::SeekFrom;

use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::constants::header;

/// Validates an IFD offset to ensure it's within reasonable bounds
///
/// # Arguments
/// * `offset` - The offset to validate
/// * `file_size` - The file size for validation
///
/// # Returns
/// Ok if the offset is valid, a structural error otherwise
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> TiffResult<()> {
    if offset >= file_size || offset < 8 {
        return Err(TiffError::structural(format!(
            "Invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }

    Ok(())
}

/// Gets the file size for validation purposes
///
/// # Returns
/// The file size or u64::MAX if it couldn't be determined
pub fn get_file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let file_size = match reader.seek(SeekFrom::End(0)) {
        Ok(size) => size,
        Err(e) => {
            warn!("Could not determine file size: {}", e);
            u64::MAX
        }
    };
    reader.seek(SeekFrom::Start(current_position))?;

    Ok(file_size)
}

/// Validates the BigTIFF header
///
/// After the version number (43) come the offset size, which must be 8,
/// and a reserved value, which must be 0.
pub fn validate_bigtiff_header(
    reader: &mut dyn SeekableReader,
    byte_order_handler: &dyn ByteOrderHandler
) -> TiffResult<()> {
    let offset_size = byte_order_handler.read_u16(reader)?;
    let zeros = byte_order_handler.read_u16(reader)?;

    debug!("BigTIFF offset size: {}, reserved: {}", offset_size, zeros);

    if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
        error!("Invalid BigTIFF header: offset_size={}, zeros={}", offset_size, zeros);
        return Err(TiffError::InvalidBigTIFFHeader);
    }

    Ok(())
}

/// Validates a numeric range to ensure it's within bounds
///
/// # Arguments
/// * `value` - The value to validate
/// * `min` - The minimum valid value (inclusive)
/// * `max` - The maximum valid value (inclusive)
/// * `name` - Name of the value for error messages
///
/// # Returns
/// Ok if the value is valid, a structural error otherwise
pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> TiffResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(TiffError::structural(format!(
            "Invalid {}: {} (must be between {} and {})",
            name, value, min, max
        )));
    }

    Ok(())
}

/// Rounds a buffer size up to a multiple of 4 bytes
pub fn round_up_to_word(size: u64) -> u64 {
    size.saturating_add(3) & !3
}

/// Rejects working buffers that imply an implausible compression ratio
///
/// A chunk claiming to expand to more than `file_size * max_ratio` bytes
/// cannot come from honest data in this stream.
///
/// # Arguments
/// * `requested` - Buffer size in bytes
/// * `file_size` - Size of the input stream
/// * `max_ratio` - Largest plausible compression ratio
///
/// # Returns
/// Ok if the size is plausible, a structural error otherwise
pub fn validate_buffer_size(requested: u64, file_size: u64, max_ratio: u64) -> TiffResult<()> {
    let ceiling = file_size.saturating_mul(max_ratio);
    if requested > ceiling {
        error!("Buffer of {} bytes exceeds {} x file size {}", requested, max_ratio, file_size);
        return Err(TiffError::structural(format!(
            "Insufficient image data in file: {} byte buffer for a {} byte file",
            requested, file_size
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_to_word() {
        assert_eq!(round_up_to_word(0), 0);
        assert_eq!(round_up_to_word(1), 4);
        assert_eq!(round_up_to_word(12), 12);
        assert_eq!(round_up_to_word(13), 16);
    }

    #[test]
    fn test_buffer_size_guard() {
        assert!(validate_buffer_size(1000, 10, 100).is_ok());
        assert!(validate_buffer_size(1001, 10, 100).is_err());
    }

    #[test]
    fn test_ifd_offset_bounds() {
        assert!(validate_ifd_offset(8, 100).is_ok());
        assert!(validate_ifd_offset(4, 100).is_err());
        assert!(validate_ifd_offset(100, 100).is_err());
    }
}
