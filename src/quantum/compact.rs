//! Sample compaction and expansion
//!
//! A frame may store more samples per pixel than the quantum kind
//! consumes (an RGB image with an unused extra sample, say). Before import
//! each row is compacted in place so that only the first `target` samples
//! of every pixel remain, packed contiguously. On write the opposite step
//! pads each pixel with zero samples.
//!
//! Byte-sized samples (including 64-bit floats) are moved as whole bytes;
//! narrower or odd widths go through the bit reader and writer.

use log::trace;

use crate::quantum::bits::{BitReader, BitWriter};
use crate::tiff::errors::{TiffError, TiffResult};

fn check_sample_width(bits_per_sample: u16, what: &str) -> TiffResult<()> {
    if bits_per_sample == 0 || (bits_per_sample > 32 && bits_per_sample != 64) {
        return Err(TiffError::structural(format!("Cannot {} {}-bit samples", what, bits_per_sample)));
    }
    Ok(())
}

fn check_length(length: usize, needed: usize) -> TiffResult<()> {
    if length < needed {
        return Err(TiffError::structural(format!(
            "Sample buffer of {} bytes is shorter than the {} bytes it should hold", length, needed)));
    }
    Ok(())
}

/// Compacts `rows` rows of `columns` pixels in place
///
/// Each source row is `ceil(columns * samples * bits / 8)` bytes and each
/// compacted row starts on a byte boundary.
///
/// # Arguments
/// * `buffer` - Transfer buffer holding the rows
/// * `columns` - Pixels per row
/// * `rows` - Number of rows
/// * `bits_per_sample` - Sample width, 1..=32 or 64
/// * `samples` - Samples stored per pixel
/// * `target` - Samples to keep per pixel
///
/// # Returns
/// The number of meaningful bytes left at the start of the buffer
pub fn compact_samples(
    buffer: &mut [u8],
    columns: usize,
    rows: usize,
    bits_per_sample: u16,
    samples: u16,
    target: u16,
) -> TiffResult<usize> {
    check_sample_width(bits_per_sample, "compact")?;
    if target > samples {
        return Err(TiffError::structural(format!(
            "Cannot compact {} samples per pixel down to {}", samples, target)));
    }

    let bits = bits_per_sample as usize;
    let source_row = (columns * samples as usize * bits + 7) / 8;
    let target_row = (columns * target as usize * bits + 7) / 8;
    if target == samples {
        return Ok(source_row * rows);
    }
    trace!("Compacting {} rows from {} to {} samples per pixel", rows, samples, target);

    if bits % 8 == 0 {
        check_length(buffer.len(), source_row * rows)?;
        let width = bits / 8;
        let (source_pixel, target_pixel) = (samples as usize * width, target as usize * width);
        for row in 0..rows {
            for x in 0..columns {
                let from = row * source_row + x * source_pixel;
                buffer.copy_within(from..from + target_pixel, row * target_row + x * target_pixel);
            }
        }
        return Ok(target_row * rows);
    }

    let mut writer = BitWriter::default();
    for row in 0..rows {
        let mut reader = BitReader::at_byte(row * source_row);
        writer = BitWriter::at_byte(row * target_row);
        for _ in 0..columns {
            for sample in 0..samples {
                let value = reader.read(buffer, bits_per_sample);
                if sample < target {
                    writer.write(buffer, bits_per_sample, value);
                }
            }
        }
        writer.align(buffer);
    }
    Ok(writer.bytes_written().max(target_row * rows))
}

/// Copies `rows` rows into `dest`, padding every pixel with zero samples
///
/// # Arguments
/// * `source` - Rows of `samples` samples per pixel, byte-aligned
/// * `dest` - Destination rows of `target` samples per pixel
/// * `columns` - Pixels per row
/// * `rows` - Number of rows
/// * `bits_per_sample` - Sample width, 1..=32 or 64
/// * `samples` - Samples per pixel in `source`
/// * `target` - Samples per pixel in `dest`
///
/// # Returns
/// Bytes written to `dest`
pub fn expand_samples(
    source: &[u8],
    dest: &mut [u8],
    columns: usize,
    rows: usize,
    bits_per_sample: u16,
    samples: u16,
    target: u16,
) -> TiffResult<usize> {
    check_sample_width(bits_per_sample, "expand")?;
    if target < samples {
        return Err(TiffError::structural(format!(
            "Cannot expand {} samples per pixel down to {}", samples, target)));
    }

    let bits = bits_per_sample as usize;
    let source_row = (columns * samples as usize * bits + 7) / 8;
    let target_row = (columns * target as usize * bits + 7) / 8;
    check_length(dest.len(), target_row * rows)?;
    dest[..target_row * rows].fill(0);

    if bits % 8 == 0 {
        check_length(source.len(), source_row * rows)?;
        let width = bits / 8;
        let (source_pixel, target_pixel) = (samples as usize * width, target as usize * width);
        for row in 0..rows {
            for x in 0..columns {
                let from = row * source_row + x * source_pixel;
                let to = row * target_row + x * target_pixel;
                dest[to..to + source_pixel].copy_from_slice(&source[from..from + source_pixel]);
            }
        }
        return Ok(target_row * rows);
    }

    for row in 0..rows {
        let mut reader = BitReader::at_byte(row * source_row);
        let mut writer = BitWriter::at_byte(row * target_row);
        for _ in 0..columns {
            for sample in 0..target {
                let value = if sample < samples { reader.read(source, bits_per_sample) } else { 0 };
                writer.write(dest, bits_per_sample, value);
            }
        }
    }
    Ok(target_row * rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_extra_byte_samples() {
        // Two RGBX pixels per row, two rows
        let mut data: Vec<u8> = (1..=16).collect();
        let used = compact_samples(&mut data, 2, 2, 8, 4, 3).unwrap();
        assert_eq!(used, 12);
        assert_eq!(&data[..12], &[1, 2, 3, 5, 6, 7, 9, 10, 11, 13, 14, 15]);
    }

    #[test]
    fn test_sub_byte_rows_stay_aligned() {
        // 4-bit gray+alpha, 3 pixels per row: 3 bytes per source row
        let mut data = vec![0x1A, 0x2B, 0x3C, 0x4D, 0x5E, 0x6F];
        let used = compact_samples(&mut data, 3, 2, 4, 2, 1).unwrap();
        assert_eq!(used, 4);
        assert_eq!(&data[..4], &[0x12, 0x30, 0x45, 0x60]);
    }

    #[test]
    fn test_noop_when_nothing_to_drop() {
        let mut data = vec![9u8; 6];
        assert_eq!(compact_samples(&mut data, 2, 1, 8, 3, 3).unwrap(), 6);
        assert_eq!(data, vec![9u8; 6]);
    }

    #[test]
    fn test_expand_pads_with_zero() {
        let source = [1u8, 2, 3, 4, 5, 6];
        let mut dest = [0xFFu8; 8];
        assert_eq!(expand_samples(&source, &mut dest, 2, 1, 8, 3, 4).unwrap(), 8);
        assert_eq!(dest, [1, 2, 3, 0, 4, 5, 6, 0]);
    }

    #[test]
    fn test_double_samples_move_whole() {
        let pixels = [0.25f64, -1.0, 7.5, 0.75, 2.0, 3.0];
        let mut data: Vec<u8> = pixels.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let used = compact_samples(&mut data, 2, 1, 64, 3, 1).unwrap();
        assert_eq!(used, 16);
        assert_eq!(f64::from_ne_bytes(data[..8].try_into().unwrap()), 0.25);
        assert_eq!(f64::from_ne_bytes(data[8..16].try_into().unwrap()), 0.75);

        let mut padded = [0xFFu8; 32];
        assert_eq!(expand_samples(&data[..16], &mut padded, 2, 1, 64, 1, 2).unwrap(), 32);
        assert_eq!(&padded[..8], &0.25f64.to_ne_bytes());
        assert_eq!(&padded[8..16], &[0u8; 8]);
        assert_eq!(&padded[16..24], &0.75f64.to_ne_bytes());
    }

    #[test]
    fn test_unsupported_widths() {
        let mut data = vec![0u8; 64];
        assert!(compact_samples(&mut data, 1, 1, 48, 2, 1).is_err());
        assert!(compact_samples(&mut data, 1, 1, 0, 2, 1).is_err());
    }

    #[test]
    fn test_rejects_growth() {
        let mut data = vec![0u8; 4];
        assert!(compact_samples(&mut data, 1, 1, 8, 2, 3).is_err());
    }
}
