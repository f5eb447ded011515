//! Handler for WebP compressed strips and tiles

use std::io::Cursor;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::jpeg::decode_chunk_image;

/// WebP compression handler (compression code 50001)
///
/// Chunks are written losslessly; the encoder has no lossy mode.
pub struct WebpHandler {
    /// Chunk width in pixels
    width: u32,
    /// Samples per pixel, 3 or 4
    samples: u16,
}

impl WebpHandler {
    /// Create a handler for chunks `width` pixels wide
    pub fn new(width: u32, samples: u16) -> Self {
        WebpHandler { width, samples }
    }
}

impl CompressionHandler for WebpHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let decoded = decode_chunk_image(data, ImageFormat::WebP, self.width, self.samples, expected)?;
        let raw = match self.samples {
            4 => decoded.to_rgba8().into_raw(),
            _ => decoded.to_rgb8().into_raw(),
        };
        Ok(raw)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let color_type = match self.samples {
            3 => ExtendedColorType::Rgb8,
            4 => ExtendedColorType::Rgba8,
            n => return Err(TiffError::structural(format!("WebP cannot carry {} samples per pixel", n))),
        };
        let row_bytes = self.width as usize * self.samples as usize;
        if row_bytes == 0 || data.len() % row_bytes != 0 {
            return Err(TiffError::structural(format!(
                "WebP chunk of {} bytes is not a whole number of {}-byte rows", data.len(), row_bytes)));
        }
        let height = (data.len() / row_bytes) as u32;

        let mut output = Cursor::new(Vec::new());
        WebPEncoder::new_lossless(&mut output)
            .write_image(data, self.width, height, color_type)
            .map_err(|e| TiffError::GenericError(format!("WebP encode error: {}", e)))?;
        Ok(output.into_inner())
    }

    fn name(&self) -> &'static str {
        "WebP"
    }

    fn code(&self) -> u64 {
        compression::WEBP as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webp_lossless_chunk() {
        let data: Vec<u8> = (0..8 * 4 * 3).map(|i| (i * 5) as u8).collect();
        let handler = WebpHandler::new(8, 3);
        let packed = handler.compress(&data).unwrap();
        assert_eq!(handler.decompress(&packed, data.len()).unwrap(), data);
    }
}
