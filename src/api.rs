use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use image::{DynamicImage, ImageBuffer, Rgba};
use log::info;

use crate::codec::rgba::cmyk_to_rgb;
use crate::coder::{decode, encode, encode_file, CoderContext, DecodeOutcome, ReadOptions, ResourceLimiter, WriteOptions};
use crate::model::{Colorspace, Image, ImageList, Pixel, MAX_RGB};
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::reader::TiffReaderBuilder;
use crate::tiff::warnings::Warning;
use crate::utils::config::CoderConfig;
use crate::utils::logger::Logger;
use crate::utils::tiff_code_translators::compression_code_to_name;

/// Main interface to the tiffcoder library
pub struct TiffCoder {
    logger: Logger,
    config: CoderConfig,
    /// Limiter for every call; the process-wide one when unset
    limiter: Option<ResourceLimiter>,
}

impl TiffCoder {
    /// Create a new TiffCoder instance
    ///
    /// # Arguments
    /// * `log_file` - Optional path to a log file recording each call; no file is written when omitted
    ///
    /// # Returns
    /// A TiffCoder instance or an error if the log file cannot be created
    pub fn new(log_file: Option<&str>) -> TiffResult<Self> {
        let logger = match log_file {
            Some(path) => Logger::new(path)?,
            None => Logger::disabled(),
        };
        Ok(TiffCoder { logger, config: CoderConfig::default(), limiter: None })
    }

    /// Uses `config` for every later call
    pub fn with_config(mut self, config: CoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a TOML file
    pub fn with_config_file<P: AsRef<Path>>(self, path: P) -> TiffResult<Self> {
        let config = CoderConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Binds every later call to `limiter` instead of the process-wide one
    pub fn with_limiter(mut self, limiter: ResourceLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    fn context(&self) -> CoderContext {
        match &self.limiter {
            Some(limiter) => CoderContext::with_limiter(self.config.clone(), limiter.clone()),
            None => CoderContext::new(self.config.clone()),
        }
    }

    fn record(&self, message: &str, warnings: &[Warning]) -> TiffResult<()> {
        self.logger.log(message)?;
        let lines: Vec<String> = warnings.iter().map(|w| format!("[{}] {}", w.code, w.message)).collect();
        self.logger.log_warnings("coder", &lines)?;
        Ok(())
    }

    /// Analyze a TIFF file and return information about its structure
    ///
    /// # Arguments
    /// * `input_path` - Path to the TIFF file to analyze
    ///
    /// # Returns
    /// String containing analysis information or an error
    pub fn analyze(&self, input_path: &str) -> TiffResult<String> {
        let mut warnings = self.config.warning_context();
        let tiff = TiffReaderBuilder::new().build().load(input_path, &mut warnings)?;

        let mut result = String::from("TIFF Analysis Results:\n");
        result.push_str(&format!("  Format: {}\n", if tiff.is_big_tiff { "BigTIFF" } else { "TIFF" }));
        result.push_str(&format!("  Byte order: {}\n", tiff.byte_order.name()));
        result.push_str(&format!("  Number of IFDs: {}\n", tiff.ifd_count()));

        for (i, ifd) in tiff.ifds.iter().enumerate() {
            result.push_str(&format!("\nIFD #{} (offset: {})\n", i, ifd.offset));
            result.push_str(&format!("  Number of entries: {}\n", ifd.entries.len()));
            if let Some((width, height)) = ifd.get_dimensions() {
                result.push_str(&format!("  Dimensions: {}x{}\n", width, height));
            }
            result.push_str(&format!("  Samples per pixel: {}\n", ifd.get_samples_per_pixel()));
            if let Some(code) = ifd.get_u64(tags::COMPRESSION) {
                result.push_str(&format!("  Compression: {} ({})\n", code, compression_code_to_name(code)));
            }
        }
        for warning in warnings.warnings() {
            result.push_str(&format!("\nWarning [{}]: {}\n", warning.code, warning.message));
        }

        Ok(result)
    }

    /// Decodes the frames of a TIFF file
    pub fn read_file<P: AsRef<Path>>(&self, path: P, options: &ReadOptions) -> TiffResult<DecodeOutcome> {
        let path = path.as_ref();
        let stream = BufReader::new(File::open(path)?);
        let outcome = decode(stream, options, &mut self.context())?;
        self.record(&format!("Read {} frame(s) from {}", outcome.images.len(), path.display()), &outcome.warnings)?;
        Ok(outcome)
    }

    /// Decodes the frames of an in-memory TIFF stream
    pub fn read_bytes(&self, data: &[u8], options: &ReadOptions) -> TiffResult<DecodeOutcome> {
        let outcome = decode(Cursor::new(data), options, &mut self.context())?;
        self.record(&format!("Read {} frame(s) from {} bytes", outcome.images.len(), data.len()), &outcome.warnings)?;
        Ok(outcome)
    }

    /// Geometry and metadata of every frame, without pixels
    pub fn ping<P: AsRef<Path>>(&self, path: P) -> TiffResult<ImageList> {
        let options = ReadOptions { ping: true, ..ReadOptions::default() };
        Ok(self.read_file(path, &options)?.images)
    }

    /// Encodes `images` into a file
    ///
    /// # Returns
    /// The warnings raised while encoding
    pub fn write_file<P: AsRef<Path>>(&self, images: &ImageList, path: P, options: &WriteOptions)
                                      -> TiffResult<Vec<Warning>> {
        let path = path.as_ref();
        let mut context = self.context();
        encode_file(images, path, options, &mut context)?;
        let warnings = context.take_warnings();
        self.record(&format!("Wrote {} frame(s) to {}", images.len(), path.display()), &warnings)?;
        Ok(warnings)
    }

    /// Encodes `images` into an in-memory TIFF stream
    pub fn write_bytes(&self, images: &ImageList, options: &WriteOptions) -> TiffResult<Vec<u8>> {
        let mut context = self.context();
        let data = encode(images, Cursor::new(Vec::new()), options, &mut context)?.into_inner();
        self.record(&format!("Wrote {} frame(s) into {} bytes", images.len(), data.len()),
                    &context.take_warnings())?;
        Ok(data)
    }

    /// Re-encodes a TIFF file with new write options
    ///
    /// # Returns
    /// The warnings raised by the decode and the encode, in that order
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, input_path: P, output_path: Q,
                                                   read_options: &ReadOptions,
                                                   write_options: &WriteOptions) -> TiffResult<Vec<Warning>> {
        info!("Converting {} to {}", input_path.as_ref().display(), output_path.as_ref().display());
        let mut outcome = self.read_file(input_path, read_options)?;
        let written = self.write_file(&outcome.images, output_path, write_options)?;
        outcome.warnings.extend(written);
        Ok(outcome.warnings)
    }
}

/// Converts a decoded frame into a 16-bit RGBA image
///
/// CMYK frames are converted to RGB; opacity is inverted into alpha.
pub fn to_dynamic_image(image: &Image) -> DynamicImage {
    let buffer = ImageBuffer::from_fn(image.columns, image.rows, |x, y| {
        let index = y as usize * image.columns as usize + x as usize;
        let pixel = image.pixels.get(index).copied().unwrap_or_default();
        let color = match image.colorspace {
            Colorspace::Cmyk => cmyk_to_rgb(pixel.red, pixel.green, pixel.blue, pixel.black),
            _ => pixel,
        };
        let alpha = if image.matte { MAX_RGB - pixel.opacity } else { MAX_RGB };
        Rgba([color.red, color.green, color.blue, alpha])
    });
    DynamicImage::ImageRgba16(buffer)
}

/// Builds a direct-class frame from any image the `image` crate decodes
pub fn from_dynamic_image(source: &DynamicImage) -> Image {
    let rgba = source.to_rgba16();
    let mut image = Image::new(rgba.width(), rgba.height());
    image.depth = if source.color().bytes_per_pixel() / source.color().channel_count().max(1) > 1 { 16 } else { 8 };
    image.matte = source.color().has_alpha();
    image.pixels = rgba.pixels()
        .map(|p| Pixel {
            red: p[0],
            green: p[1],
            blue: p[2],
            black: 0,
            opacity: MAX_RGB - p[3],
        })
        .collect();
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_image_alpha_inverts() {
        let mut image = Image::filled(2, 1, Pixel::rgb(MAX_RGB, 0, 0));
        image.matte = true;
        image.pixels[1].opacity = MAX_RGB;
        let dynamic = to_dynamic_image(&image);
        let rgba = dynamic.to_rgba16();
        assert_eq!(rgba.get_pixel(0, 0).0, [MAX_RGB, 0, 0, MAX_RGB]);
        assert_eq!(rgba.get_pixel(1, 0).0[3], 0);

        let back = from_dynamic_image(&dynamic);
        assert!(back.matte);
        assert_eq!(back.depth, 16);
        assert_eq!(back.pixels, image.pixels);
    }

    #[test]
    fn test_bytes_round_trip() {
        let coder = TiffCoder::new(None).unwrap().with_limiter(ResourceLimiter::new());
        let image = Image::filled(3, 2, Pixel::rgb(257 * 10, 257 * 20, 257 * 30));
        let options = WriteOptions { compression: crate::model::CompressionType::Lzw, ..WriteOptions::default() };
        let data = coder.write_bytes(&vec![image.clone()], &options).unwrap();

        let outcome = coder.read_bytes(&data, &ReadOptions::default()).unwrap();
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.images[0].pixels, image.pixels);
    }

    #[test]
    fn test_config_file_is_applied() {
        let path = std::env::temp_dir().join("tiffcoder_api_config.toml");
        std::fs::write(&path, "max_compress_ratio = 50\n").unwrap();
        let coder = TiffCoder::new(None).unwrap().with_config_file(&path).unwrap();
        assert_eq!(coder.config.max_compress_ratio, 50);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_cmyk_frame_converts_to_rgb() {
        let mut image = Image::filled(1, 1, Pixel::default());
        image.colorspace = Colorspace::Cmyk;
        image.pixels[0].black = MAX_RGB;
        let rgba = to_dynamic_image(&image).to_rgba16();
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 0, MAX_RGB]);
    }
}
