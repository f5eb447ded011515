//! Handler for LZMA2 compressed data
//!
//! Chunks are stored as complete .xz streams, one per strip or tile.

use std::io::{Read, Write};
use log::debug;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// Preset used when no quality is given; higher presets rarely pay off on image data
pub const DEFAULT_PRESET: u32 = 1;

/// LZMA compression handler (compression code 34925)
pub struct LzmaHandler {
    /// Encoder preset (1-9)
    preset: u32,
}

impl LzmaHandler {
    /// Create a handler with the default preset
    pub fn new() -> Self {
        LzmaHandler { preset: DEFAULT_PRESET }
    }

    /// Create a handler with the given preset
    pub fn with_preset(preset: u32) -> Self {
        LzmaHandler { preset: preset.clamp(1, 9) }
    }
}

impl Default for LzmaHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for LzmaHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let mut decoder = XzDecoder::new(data).take(expected as u64);
        let mut decompressed_data = Vec::new();
        match decoder.read_to_end(&mut decompressed_data) {
            Ok(_) => Ok(decompressed_data),
            Err(e) if !decompressed_data.is_empty() => {
                debug!("LZMA stream ended early after {} bytes: {}", decompressed_data.len(), e);
                Ok(decompressed_data)
            },
            Err(e) => Err(TiffError::CorruptData(format!("LZMA decompression error: {}", e))),
        }
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = XzEncoder::new(Vec::with_capacity(data.len() / 2), self.preset);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        "LZMA"
    }

    fn code(&self) -> u64 {
        compression::LZMA as u64
    }
}
