//! TIFF writing utilities
//!
//! Helper functions for writing TIFF files, handling alignment and
//! other low-level details.

use crate::tiff::errors::TiffResult;
use std::io::Write;

/// Align an offset to a 4-byte boundary
///
/// TIFF 6.0 recommends aligning data on word boundaries.
/// This function returns the next 4-byte aligned position given a current offset.
pub fn align_to_4_bytes(offset: u64) -> u64 {
    let remainder = offset % 4;
    if remainder == 0 {
        offset
    } else {
        offset + (4 - remainder)
    }
}

/// Write padding bytes to align to 4-byte boundary
///
/// After writing a block of data, this function adds the necessary
/// padding bytes to ensure the next write will be aligned to a 4-byte boundary.
pub fn write_padding(writer: &mut dyn Write, data_len: usize) -> TiffResult<()> {
    let padding = calculate_padding(data_len);
    if padding > 0 {
        writer.write_all(&[0u8; 4][..padding])?;
    }
    Ok(())
}

/// Calculate padding required to align to 4-byte boundary
pub fn calculate_padding(data_len: usize) -> usize {
    (4 - (data_len % 4)) % 4
}

/// Pads a blob with zeros to a 4-byte multiple
///
/// Used for the IPTC record, which is written as a LONG array.
pub fn pad_to_word(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    padded.resize(data.len() + calculate_padding(data.len()), 0);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_helpers() {
        assert_eq!(align_to_4_bytes(9), 12);
        assert_eq!(align_to_4_bytes(12), 12);
        assert_eq!(calculate_padding(5), 3);
        assert_eq!(pad_to_word(&[1, 2, 3, 4, 5]).len(), 8);
    }
}
