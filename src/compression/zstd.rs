//! Handler for ZSTD compressed data

use std::io::Read;
use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use log::{debug, warn};

/// ZSTD compression handler (compression code 50000)
pub struct ZstdHandler {
    /// Compression level (1-22, default 9)
    compression_level: i32,
}

impl ZstdHandler {
    /// Create a new ZSTD handler with default compression level
    pub fn new() -> Self {
        ZstdHandler {
            compression_level: 9
        }
    }

    /// Create a new ZSTD handler with specified compression level
    pub fn with_level(level: i32) -> Self {
        let level = level.clamp(1, 22);
        ZstdHandler {
            compression_level: level
        }
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        debug!("ZSTD decompressing {} bytes", data.len());
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut decompressed_data = Vec::new();
        let result = zstd::stream::read::Decoder::new(data)
            .and_then(|decoder| decoder.take(expected as u64).read_to_end(&mut decompressed_data));
        match result {
            Ok(_) => {
                debug!("ZSTD decompressed to {} bytes", decompressed_data.len());
                Ok(decompressed_data)
            },
            Err(e) => {
                warn!("ZSTD decompression error: {}", e);
                Err(TiffError::CorruptData(format!("ZSTD decompression error: {}", e)))
            }
        }
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        debug!("ZSTD compressing {} bytes with level {}", data.len(), self.compression_level);

        match zstd::encode_all(data, self.compression_level) {
            Ok(compressed) => {
                debug!("ZSTD compressed to {} bytes", compressed.len());
                Ok(compressed)
            },
            Err(e) => {
                warn!("ZSTD compression error: {}", e);
                Err(TiffError::GenericError(format!("ZSTD compression error: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        compression::ZSTD as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zstd_output_is_capped() {
        let handler = ZstdHandler::new();
        let packed = handler.compress(&vec![9u8; 1 << 20]).unwrap();
        let unpacked = handler.decompress(&packed, 1000).unwrap();
        assert_eq!(unpacked, vec![9u8; 1000]);
    }
}
