//! Handler for PackBits run-length encoded data

use crate::tiff::constants::compression;
use crate::tiff::errors::TiffResult;
use super::handler::CompressionHandler;

/// PackBits compression handler (compression code 32773)
pub struct PackBitsHandler;

/// Longest literal or replicate run
const MAX_RUN: usize = 128;

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let mut out = Vec::with_capacity(expected.min(data.len().saturating_mul(2)));
        let mut i = 0;
        while i < data.len() && out.len() < expected {
            let header = data[i] as i8;
            i += 1;
            match header {
                // No-op
                -128 => {},
                n if n >= 0 => {
                    let count = n as usize + 1;
                    let end = (i + count).min(data.len());
                    out.extend_from_slice(&data[i..end]);
                    i = end;
                },
                n => {
                    let Some(&byte) = data.get(i) else { break };
                    let count = (-(n as i16)) as usize + 1;
                    out.resize((out.len() + count).min(expected), byte);
                    i += 1;
                }
            }
        }
        out.truncate(expected);
        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
        let mut i = 0;
        while i < data.len() {
            let mut run = 1;
            while i + run < data.len() && run < MAX_RUN && data[i + run] == data[i] {
                run += 1;
            }

            if run >= 2 {
                out.push((1i16 - run as i16) as i8 as u8);
                out.push(data[i]);
                i += run;
                continue;
            }

            // Literal run up to the next pair of equal bytes
            let start = i;
            while i < data.len() && i - start < MAX_RUN {
                if i + 1 < data.len() && data[i] == data[i + 1] {
                    break;
                }
                i += 1;
            }
            if i == start {
                i += 1;
            }
            out.push((i - start - 1) as u8);
            out.extend_from_slice(&data[start..i]);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u64 {
        compression::PACKBITS as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packbits_known_vector() {
        // Example stream from TIFF 6.0, section 9
        let packed = [0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA];
        let unpacked = PackBitsHandler.decompress(&packed, 24).unwrap();
        assert_eq!(unpacked, vec![
            0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ]);
    }

    #[test]
    fn test_packbits_long_runs() {
        let mut data = vec![7u8; 300];
        data.extend((0..200).map(|i| i as u8));
        let packed = PackBitsHandler.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(PackBitsHandler.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_packbits_truncated_input() {
        assert_eq!(PackBitsHandler.decompress(&[0x05, 1, 2], 6).unwrap(), vec![1, 2]);
        assert_eq!(PackBitsHandler.decompress(&[0xFD], 4).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_packbits_stops_at_expected_size() {
        let packed = [0x81u8, 0x55].repeat(1000);
        assert_eq!(PackBitsHandler.decompress(&packed, 300).unwrap(), vec![0x55; 300]);
    }
}
