//! Horizontal differencing and bit fill order
//!
//! The predictor works on decoded rows in stream byte order, before any
//! swab to native order.

use crate::io::byte_order::ByteOrder;
use crate::tiff::errors::{TiffError, TiffResult};

fn read_word(bytes: &[u8], order: ByteOrder) -> u32 {
    match (bytes.len(), order) {
        (2, ByteOrder::LittleEndian) => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        (2, ByteOrder::BigEndian) => u16::from_be_bytes([bytes[0], bytes[1]]) as u32,
        (4, ByteOrder::LittleEndian) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        (4, ByteOrder::BigEndian) => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => bytes[0] as u32,
    }
}

fn write_word(bytes: &mut [u8], value: u32, order: ByteOrder) {
    match (bytes.len(), order) {
        (2, ByteOrder::LittleEndian) => bytes.copy_from_slice(&(value as u16).to_le_bytes()),
        (2, ByteOrder::BigEndian) => bytes.copy_from_slice(&(value as u16).to_be_bytes()),
        (4, ByteOrder::LittleEndian) => bytes.copy_from_slice(&value.to_le_bytes()),
        (4, ByteOrder::BigEndian) => bytes.copy_from_slice(&value.to_be_bytes()),
        _ => bytes[0] = value as u8,
    }
}

fn word_width(bits_per_sample: u16) -> TiffResult<usize> {
    match bits_per_sample {
        8 | 16 | 32 => Ok(bits_per_sample as usize / 8),
        bits => Err(TiffError::structural(format!(
            "Horizontal predictor is not defined for {}-bit samples", bits))),
    }
}

/// Undoes horizontal differencing, row by row
///
/// # Arguments
/// * `data` - Decoded rows
/// * `row_bytes` - Bytes per row
/// * `samples` - Samples per pixel within the chunk
/// * `bits_per_sample` - 8, 16 or 32
/// * `order` - Stream byte order
pub fn undo_horizontal(data: &mut [u8], row_bytes: usize, samples: u16, bits_per_sample: u16,
                       order: ByteOrder) -> TiffResult<()> {
    let width = word_width(bits_per_sample)?;
    let stride = samples as usize * width;
    if row_bytes == 0 {
        return Ok(());
    }
    for row in data.chunks_mut(row_bytes) {
        let mut i = stride;
        while i + width <= row.len() {
            let previous = read_word(&row[i - stride..i - stride + width], order);
            let current = read_word(&row[i..i + width], order);
            write_word(&mut row[i..i + width], current.wrapping_add(previous), order);
            i += width;
        }
    }
    Ok(())
}

/// Applies horizontal differencing, row by row
pub fn apply_horizontal(data: &mut [u8], row_bytes: usize, samples: u16, bits_per_sample: u16,
                        order: ByteOrder) -> TiffResult<()> {
    let width = word_width(bits_per_sample)?;
    let stride = samples as usize * width;
    if row_bytes == 0 {
        return Ok(());
    }
    for row in data.chunks_mut(row_bytes) {
        let words = row.len() / width;
        // Walk backwards so every difference uses the original neighbour
        for w in (stride / width..words).rev() {
            let i = w * width;
            let previous = read_word(&row[i - stride..i - stride + width], order);
            let current = read_word(&row[i..i + width], order);
            write_word(&mut row[i..i + width], current.wrapping_sub(previous), order);
        }
    }
    Ok(())
}

/// Reverses the bits of every byte, for FillOrder 2
pub fn reverse_fill_order(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = byte.reverse_bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_bit_rgb() {
        let original = vec![10u8, 20, 30, 12, 18, 40, 255, 0, 1];
        let mut data = original.clone();
        apply_horizontal(&mut data, 9, 3, 8, ByteOrder::LittleEndian).unwrap();
        assert_eq!(&data[..6], &[10, 20, 30, 2, 254, 10]);
        undo_horizontal(&mut data, 9, 3, 8, ByteOrder::LittleEndian).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_sixteen_bit_big_endian() {
        let mut data = vec![0x01, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0x00, 0x02];
        // Two rows of two gray samples
        undo_horizontal(&mut data, 4, 1, 16, ByteOrder::BigEndian).unwrap();
        assert_eq!(data, vec![0x01, 0x00, 0x01, 0x01, 0xFF, 0xFF, 0x00, 0x01]);
    }

    #[test]
    fn test_unsupported_depth() {
        let mut data = vec![0u8; 4];
        assert!(undo_horizontal(&mut data, 4, 1, 4, ByteOrder::BigEndian).is_err());
    }

    #[test]
    fn test_fill_order() {
        let mut data = vec![0b1000_0000, 0b0000_0011];
        reverse_fill_order(&mut data);
        assert_eq!(data, vec![0b0000_0001, 0b1100_0000]);
    }
}
