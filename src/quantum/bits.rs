//! MSB-first bit cursors
//!
//! Samples narrower than a byte, or of odd widths, are packed MSB first
//! and every row starts on a byte boundary. The cursors keep only a bit
//! position and borrow the buffer per call, so a reader and a writer can
//! walk the same buffer.

/// Reads samples of 1..=32 bits
#[derive(Debug, Clone, Copy, Default)]
pub struct BitReader {
    position: usize,
}

impl BitReader {
    /// Starts at byte `offset`
    pub fn at_byte(offset: usize) -> Self {
        BitReader { position: offset * 8 }
    }

    /// Current position in bits
    pub fn bit_position(&self) -> usize {
        self.position
    }

    /// Reads one `width`-bit value; bits past the buffer read as zero
    pub fn read(&mut self, buffer: &[u8], width: u16) -> u32 {
        let width = width as usize;
        if width == 8 && self.position % 8 == 0 {
            let value = buffer.get(self.position / 8).copied().unwrap_or(0);
            self.position += 8;
            return value as u32;
        }

        let mut value: u64 = 0;
        let mut remaining = width;
        while remaining > 0 {
            let byte = buffer.get(self.position / 8).copied().unwrap_or(0);
            let bit_offset = self.position % 8;
            let available = 8 - bit_offset;
            let take = available.min(remaining);
            let bits = (byte >> (available - take)) & ((1u16 << take) - 1) as u8;
            value = (value << take) | bits as u64;
            remaining -= take;
            self.position += take;
        }
        value as u32
    }

    /// Skips to the next byte boundary
    pub fn align(&mut self) {
        self.position = (self.position + 7) & !7;
    }
}

/// Writes samples of 1..=32 bits
#[derive(Debug, Clone, Copy, Default)]
pub struct BitWriter {
    position: usize,
}

impl BitWriter {
    /// Starts at byte `offset`
    pub fn at_byte(offset: usize) -> Self {
        BitWriter { position: offset * 8 }
    }

    /// Current position in bits
    pub fn bit_position(&self) -> usize {
        self.position
    }

    /// Bytes touched so far, counting a partial trailing byte
    pub fn bytes_written(&self) -> usize {
        (self.position + 7) / 8
    }

    /// Writes the low `width` bits of `value`; writes past the buffer are dropped
    pub fn write(&mut self, buffer: &mut [u8], width: u16, value: u32) {
        let width = width as usize;
        let mut remaining = width;
        while remaining > 0 {
            let index = self.position / 8;
            let bit_offset = self.position % 8;
            let available = 8 - bit_offset;
            let put = available.min(remaining);
            let bits = ((value as u64 >> (remaining - put)) & ((1u64 << put) - 1)) as u8;
            let shift = available - put;
            let mask = (((1u16 << put) - 1) as u8) << shift;
            if let Some(byte) = buffer.get_mut(index) {
                *byte = (*byte & !mask) | (bits << shift);
            }
            remaining -= put;
            self.position += put;
        }
    }

    /// Pads with zero bits to the next byte boundary
    pub fn align(&mut self, buffer: &mut [u8]) {
        let pad = (8 - self.position % 8) % 8;
        if pad > 0 {
            self.write(buffer, pad as u16, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_packed_widths() {
        // 1010 0011 | 1111 0000
        let data = [0xA3, 0xF0];
        let mut reader = BitReader::default();
        assert_eq!(reader.read(&data, 1), 1);
        assert_eq!(reader.read(&data, 3), 0b010);
        assert_eq!(reader.read(&data, 6), 0b0011_11);
        assert_eq!(reader.read(&data, 6), 0b11_0000);
        assert_eq!(reader.read(&data, 4), 0);
    }

    #[test]
    fn test_writer_matches_reader() {
        let mut buffer = [0u8; 8];
        let mut writer = BitWriter::default();
        for value in [5u32, 0x1FFF, 0, 0x3A] {
            writer.write(&mut buffer, 13, value);
        }
        let mut reader = BitReader::default();
        let values: Vec<u32> = (0..4).map(|_| reader.read(&buffer, 13)).collect();
        assert_eq!(values, vec![5, 0x1FFF, 0, 0x3A]);
        assert_eq!(writer.bytes_written(), 7);
    }

    #[test]
    fn test_full_width() {
        let mut buffer = [0u8; 4];
        BitWriter::default().write(&mut buffer, 32, 0xDEADBEEF);
        assert_eq!(buffer, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(BitReader::default().read(&buffer, 32), 0xDEADBEEF);
    }
}
