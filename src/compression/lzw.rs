//! Handler for LZW compressed data

use log::debug;
use weezl::{decode, encode, BitOrder, LzwError, LzwStatus};
use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// LZW compression handler (compression code 5)
pub struct LzwHandler;

impl LzwHandler {
    /// Old-style streams (pre-6.0) start with a 0x00 byte followed by an
    /// odd one and pack codes LSB first
    fn is_old_style(data: &[u8]) -> bool {
        data.len() >= 2 && data[0] == 0 && data[1] & 0x01 != 0
    }
}

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let mut decoder = if Self::is_old_style(data) {
            debug!("Decoding old-style LZW stream");
            decode::Decoder::new(BitOrder::Lsb, 8)
        } else {
            decode::Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
        };

        let mut out = vec![0u8; expected];
        let (mut read, mut written) = (0, 0);
        while written < expected {
            let result = decoder.decode_bytes(&data[read..], &mut out[written..]);
            read += result.consumed_in;
            written += result.consumed_out;
            match result.status {
                Ok(LzwStatus::Ok) => {},
                Ok(LzwStatus::Done | LzwStatus::NoProgress) => break,
                // A bad code after good data keeps what was decoded
                Err(LzwError::InvalidCode) if written > 0 => {
                    debug!("LZW stream broke after {} bytes", written);
                    break;
                },
                Err(LzwError::InvalidCode) => {
                    return Err(TiffError::CorruptData("LZW stream contains an invalid code".to_string()));
                },
            }
        }
        out.truncate(written);
        Ok(out)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        encode::Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(data)
            .map_err(|e| TiffError::GenericError(format!("LZW compression error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn code(&self) -> u64 {
        compression::LZW as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzw_restores_input() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 97) as u8).collect();
        let packed = LzwHandler.compress(&data).unwrap();
        assert_eq!(LzwHandler.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_lzw_output_is_capped() {
        let packed = LzwHandler.compress(&vec![0u8; 100_000]).unwrap();
        assert_eq!(LzwHandler.decompress(&packed, 64).unwrap().len(), 64);
    }
}
