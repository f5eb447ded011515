//! Handler for JPEG compressed strips and tiles
//!
//! Each chunk is a complete interchange stream, or an abbreviated one
//! relying on the shared JPEGTables. Decoding yields 8-bit interleaved
//! samples; YCbCr streams come back as RGB.

use std::io::Cursor;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, Limits};
use log::debug;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// JPEG compression handler (compression code 7)
pub struct JpegHandler {
    /// Chunk width in pixels
    width: u32,
    /// Samples per pixel, 1 or 3
    samples: u16,
    /// Encoder quality (1-100)
    quality: u8,
    /// Shared quantization and Huffman tables
    tables: Option<Vec<u8>>,
}

impl JpegHandler {
    /// Create a handler for chunks `width` pixels wide
    pub fn new(width: u32, samples: u16, quality: u8, tables: Option<Vec<u8>>) -> Self {
        JpegHandler { width, samples, quality: quality.clamp(1, 100), tables }
    }

    /// Splices the shared tables in front of an abbreviated stream
    ///
    /// The tables stream ends with EOI and the chunk starts with SOI; both
    /// markers are dropped at the seam.
    fn with_tables(&self, data: &[u8]) -> Vec<u8> {
        match &self.tables {
            Some(tables) if tables.len() > 4 && data.len() > 2 => {
                let mut merged = Vec::with_capacity(tables.len() + data.len());
                merged.extend_from_slice(&tables[..tables.len() - 2]);
                merged.extend_from_slice(&data[2..]);
                merged
            },
            _ => data.to_vec(),
        }
    }

    fn color_type(&self) -> TiffResult<ExtendedColorType> {
        match self.samples {
            1 => Ok(ExtendedColorType::L8),
            3 => Ok(ExtendedColorType::Rgb8),
            n => Err(TiffError::structural(format!("JPEG cannot carry {} samples per pixel", n))),
        }
    }
}

/// Decodes an embedded image no larger than one `expected`-byte chunk
pub(super) fn decode_chunk_image(data: &[u8], format: ImageFormat, width: u32, samples: u16,
                                 expected: usize) -> TiffResult<image::DynamicImage> {
    let mut limits = Limits::default();
    let row_bytes = width as usize * samples as usize;
    if row_bytes > 0 {
        limits.max_image_width = Some(width);
        limits.max_image_height = Some((expected / row_bytes).min(u32::MAX as usize) as u32);
    }
    let mut reader = ImageReader::with_format(Cursor::new(data), format);
    reader.limits(limits);
    reader.decode()
        .map_err(|e| TiffError::CorruptData(format!("{:?} decode error: {}", format, e)))
}

impl CompressionHandler for JpegHandler {
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>> {
        let stream = self.with_tables(data);
        let decoded = decode_chunk_image(&stream, ImageFormat::Jpeg, self.width, self.samples, expected)?;
        debug!("JPEG chunk decoded to {}x{}", decoded.width(), decoded.height());

        let raw = match self.samples {
            1 => decoded.to_luma8().into_raw(),
            _ => decoded.to_rgb8().into_raw(),
        };
        Ok(raw)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let color_type = self.color_type()?;
        let row_bytes = self.width as usize * self.samples as usize;
        if row_bytes == 0 || data.len() % row_bytes != 0 {
            return Err(TiffError::structural(format!(
                "JPEG chunk of {} bytes is not a whole number of {}-byte rows", data.len(), row_bytes)));
        }
        let height = (data.len() / row_bytes) as u32;

        let mut output = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .write_image(data, self.width, height, color_type)
            .map_err(|e| TiffError::GenericError(format!("JPEG encode error: {}", e)))?;
        Ok(output.into_inner())
    }

    fn name(&self) -> &'static str {
        "JPEG"
    }

    fn code(&self) -> u64 {
        compression::JPEG as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_splice() {
        let handler = JpegHandler::new(8, 3, 75, Some(vec![0xFF, 0xD8, 0xFF, 0xDB, 0x01, 0xFF, 0xD9]));
        let merged = handler.with_tables(&[0xFF, 0xD8, 0xFF, 0xDA, 0x02]);
        assert_eq!(merged, vec![0xFF, 0xD8, 0xFF, 0xDB, 0x01, 0xFF, 0xDA, 0x02]);
    }

    #[test]
    fn test_jpeg_gray_within_tolerance() {
        let width = 16u32;
        let data: Vec<u8> = (0..16 * 16).map(|i| ((i % 16) * 8 + 40) as u8).collect();
        let handler = JpegHandler::new(width, 1, 90, None);
        let packed = handler.compress(&data).unwrap();
        let unpacked = handler.decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked.len(), data.len());
        let error: f64 = data.iter().zip(&unpacked)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum::<f64>() / (data.len() as f64 * 255.0);
        assert!(error <= 0.06, "normalized mean error {}", error);
    }

    #[test]
    fn test_oversized_jpeg_chunk_is_refused() {
        let data = vec![128u8; 32 * 32];
        let packed = JpegHandler::new(32, 1, 75, None).compress(&data).unwrap();
        let narrow = JpegHandler::new(16, 1, 75, None);
        assert!(matches!(narrow.decompress(&packed, 16 * 16), Err(TiffError::CorruptData(_))));
    }
}
