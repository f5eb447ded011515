//! Byte swapping of multi-byte samples
//!
//! 16, 32 and 64-bit samples are handed to the import and export routines
//! in native order. 24-bit samples are always handled big-endian. Every
//! swap here is its own inverse, so the writer uses the same functions to
//! go from native order back to stream order.

use crate::io::byte_order::ByteOrder;

fn reverse_words(buffer: &mut [u8], width: usize) {
    for word in buffer.chunks_exact_mut(width) {
        word.reverse();
    }
}

/// Converts 16, 32 and 64-bit samples between `stream` and native order
///
/// # Returns
/// Whether the buffer was modified
pub fn swab_to_native(buffer: &mut [u8], bits_per_sample: u16, stream: ByteOrder) -> bool {
    if stream.is_native() {
        return false;
    }
    match bits_per_sample {
        16 | 32 | 64 => {
            reverse_words(buffer, bits_per_sample as usize / 8);
            true
        },
        _ => false,
    }
}

/// Converts 24-bit samples between `stream` order and big-endian
///
/// # Returns
/// Whether the buffer was modified
pub fn swab_to_big_endian(buffer: &mut [u8], bits_per_sample: u16, stream: ByteOrder) -> bool {
    if bits_per_sample != 24 || stream == ByteOrder::BigEndian {
        return false;
    }
    reverse_words(buffer, 3);
    true
}

/// Brings samples of any width into the order import expects
pub fn normalize_samples(buffer: &mut [u8], bits_per_sample: u16, stream: ByteOrder) {
    if !swab_to_native(buffer, bits_per_sample, stream) {
        swab_to_big_endian(buffer, bits_per_sample, stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign() -> ByteOrder {
        if ByteOrder::LittleEndian.is_native() {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    #[test]
    fn test_native_stream_untouched() {
        let mut data = vec![1, 2, 3, 4];
        let native = ByteOrder::native();
        assert!(!swab_to_native(&mut data, 16, native));
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_foreign_words_reversed() {
        let mut data = vec![1, 2, 3, 4];
        assert!(swab_to_native(&mut data, 32, foreign()));
        assert_eq!(data, vec![4, 3, 2, 1]);
        assert!(!swab_to_native(&mut data, 8, foreign()));
    }

    #[test]
    fn test_24_bit_little_endian() {
        let mut data = vec![1, 2, 3, 4, 5, 6];
        assert!(swab_to_big_endian(&mut data, 24, ByteOrder::LittleEndian));
        assert_eq!(data, vec![3, 2, 1, 6, 5, 4]);
        assert!(!swab_to_big_endian(&mut data, 24, ByteOrder::BigEndian));
    }
}
