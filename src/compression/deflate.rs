//! Handler for Adobe Deflate compressed data

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::debug;
use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// Deflate (Zlib) compression handler
///
/// Serves both the Adobe code (8) and the pre-standard code (32946); the
/// stream format is the same.
pub struct AdobeDeflateHandler {
    /// Compression level (1-9)
    level: u32,
    /// Code written to the Compression tag
    code: u16,
}

impl AdobeDeflateHandler {
    /// Create a handler for the Adobe code with the default level
    pub fn new() -> Self {
        AdobeDeflateHandler { level: 6, code: compression::DEFLATE }
    }

    /// Create a handler with the given code and level
    pub fn with_level(code: u16, level: u32) -> Self {
        AdobeDeflateHandler { level: level.clamp(1, 9), code }
    }
}

impl Default for AdobeDeflateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for AdobeDeflateHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data).take(expected as u64);
        let mut decompressed_data = Vec::with_capacity(expected.min(data.len().saturating_mul(4)));
        match decoder.read_to_end(&mut decompressed_data) {
            Ok(_) => Ok(decompressed_data),
            // A truncated stream still yields what was inflated so far
            Err(e) if !decompressed_data.is_empty() => {
                debug!("Deflate stream ended early after {} bytes: {}", decompressed_data.len(), e);
                Ok(decompressed_data)
            },
            Err(e) => Err(TiffError::CorruptData(format!("Deflate decompression error: {}", e))),
        }
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        "Adobe Deflate"
    }

    fn code(&self) -> u64 {
        self.code as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflate_stops_at_expected_size() {
        let handler = AdobeDeflateHandler::new();
        let packed = handler.compress(&vec![0u8; 1 << 20]).unwrap();
        assert_eq!(handler.decompress(&packed, 4096).unwrap().len(), 4096);
    }

    #[test]
    fn test_truncated_stream_keeps_prefix() {
        let handler = AdobeDeflateHandler::new();
        let data: Vec<u8> = (0..8192u32).map(|i| (i * 31 % 253) as u8).collect();
        let packed = handler.compress(&data).unwrap();
        let partial = handler.decompress(&packed[..packed.len() / 2], data.len()).unwrap();
        assert!(!partial.is_empty() && partial.len() < data.len());
        assert_eq!(&data[..partial.len()], &partial[..]);
    }
}
