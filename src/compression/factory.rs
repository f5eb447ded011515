//! Factory for creating compression handlers

use log::debug;
use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::tiff_code_translators::compression_code_to_name;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;
use super::lzw::LzwHandler;
use super::lzma::{LzmaHandler, DEFAULT_PRESET};
use super::packbits::PackBitsHandler;
use super::jpeg::JpegHandler;
use super::webp::WebpHandler;

/// Chunk geometry and scheme parameters a handler may need
#[derive(Debug, Clone)]
pub struct CodecParams {
    /// Chunk width in pixels
    pub width: u32,
    /// Samples per pixel within one chunk (1 for separate planes)
    pub samples: u16,
    /// Deflate level (1-9)
    pub zip_level: u32,
    /// Zstd level (1-22)
    pub zstd_level: i32,
    /// LZMA preset (1-9)
    pub lzma_preset: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Shared JPEG tables
    pub jpeg_tables: Option<Vec<u8>>,
}

impl Default for CodecParams {
    fn default() -> Self {
        CodecParams {
            width: 0,
            samples: 1,
            zip_level: 6,
            zstd_level: 9,
            lzma_preset: DEFAULT_PRESET,
            jpeg_quality: 75,
            jpeg_tables: None,
        }
    }
}

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    ///
    /// Schemes that are recognized but have no codec (CCITT, JBIG,
    /// old-style JPEG, SGILog) yield `UnsupportedCompression`.
    pub fn create_handler(code: u64, params: &CodecParams) -> TiffResult<Box<dyn CompressionHandler>> {
        debug!("Creating {} handler (code {})", compression_code_to_name(code), code);
        let code16 = u16::try_from(code).map_err(|_| TiffError::UnsupportedCompression(code))?;
        match code16 {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::DEFLATE_OLD => {
                Ok(Box::new(AdobeDeflateHandler::with_level(code16, params.zip_level)))
            },
            compression::ZSTD => Ok(Box::new(ZstdHandler::with_level(params.zstd_level))),
            compression::LZW => Ok(Box::new(LzwHandler)),
            compression::LZMA => Ok(Box::new(LzmaHandler::with_preset(params.lzma_preset))),
            compression::PACKBITS => Ok(Box::new(PackBitsHandler)),
            compression::JPEG => Ok(Box::new(JpegHandler::new(
                params.width, params.samples, params.jpeg_quality, params.jpeg_tables.clone()))),
            compression::WEBP => Ok(Box::new(WebpHandler::new(params.width, params.samples))),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Whether a codec is linked for the given compression code
    pub fn is_supported(code: u64) -> bool {
        matches!(u16::try_from(code), Ok(compression::NONE | compression::DEFLATE | compression::DEFLATE_OLD
            | compression::ZSTD | compression::LZW | compression::LZMA | compression::PACKBITS
            | compression::JPEG | compression::WEBP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossless_handlers_restore_input() {
        let data: Vec<u8> = (0..4096u32).map(|i| ((i * 7) % 251) as u8).collect();
        for code in [compression::NONE, compression::LZW, compression::DEFLATE,
                     compression::DEFLATE_OLD, compression::PACKBITS, compression::ZSTD, compression::LZMA] {
            let handler = CompressionFactory::create_handler(code as u64, &CodecParams::default()).unwrap();
            assert_eq!(handler.code(), code as u64);
            let packed = handler.compress(&data).unwrap();
            assert_eq!(handler.decompress(&packed, data.len()).unwrap(), data, "{}", handler.name());
        }
    }

    #[test]
    fn test_known_but_unlinked_schemes() {
        for code in [compression::CCITT_FAX3, compression::CCITT_FAX4, compression::JBIG,
                     compression::JPEG_OLD, compression::SGILOG] {
            assert!(!CompressionFactory::is_supported(code as u64));
            assert!(matches!(
                CompressionFactory::create_handler(code as u64, &CodecParams::default()),
                Err(TiffError::UnsupportedCompression(_))));
        }
    }
}
