//! Conversion command
//!
//! This module implements the command that decodes a TIFF file and
//! encodes it again with a new compression, layout, depth or byte order.

use std::fs::File;
use std::io::BufReader;
use clap::ArgMatches;
use log::{info, warn};

use crate::coder::options::{parse_alpha, parse_tile_geometry};
use crate::coder::{decode, encode_file, DecodeContext, EncodeContext, OutputType, ReadOptions, WriteOptions};
use crate::commands::command_traits::Command;
use crate::commands::{input_file, load_config, parse_number, read_options};
use crate::io::byte_order::ByteOrder;
use crate::model::CompressionType;
use crate::quantum::SampleType;
use crate::tiff::constants::predictor;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::warnings::Warning;
use crate::utils::config::CoderConfig;
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;

/// Command for converting a TIFF file
pub struct ConvertCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Path to the output file
    output_file: String,
    read_options: ReadOptions,
    write_options: WriteOptions,
    config: CoderConfig,
    /// Draw progress bars while decoding and encoding
    show_progress: bool,
    /// Logger for recording operations
    logger: &'a Logger,
}

/// Parses a predictor given by name or code
fn parse_predictor(text: &str) -> TiffResult<u16> {
    match text.to_lowercase().as_str() {
        "none" => Ok(predictor::NONE),
        "horizontal" => Ok(predictor::HORIZONTAL),
        "float" | "floating-point" => Ok(predictor::FLOATING_POINT),
        other => other.parse::<u16>()
            .map_err(|_| TiffError::GenericError(format!("Unknown predictor: {}", text))),
    }
}

/// Builds the encode options from the command line
pub fn parse_write_options(args: &ArgMatches) -> TiffResult<WriteOptions> {
    let mut options = WriteOptions::default();

    if let Some(name) = args.get_one::<String>("compression") {
        options.compression = CompressionType::from_name(name)
            .ok_or_else(|| TiffError::GenericError(format!("Unknown compression name: {}", name)))?;
    }
    if let Some(quality) = parse_number::<u8>(args, "quality")? {
        if quality > 100 {
            return Err(TiffError::GenericError(format!("Quality {} is outside 0-100", quality)));
        }
        options.quality = Some(quality);
    }
    if let Some(geometry) = args.get_one::<String>("tile") {
        options.tile_geometry = Some(parse_tile_geometry(geometry)?);
    }
    options.rows_per_strip = parse_number::<u32>(args, "rows-per-strip")?;
    if let Some(text) = args.get_one::<String>("predictor") {
        options.predictor = Some(parse_predictor(text)?);
    }
    options.bits_per_sample = parse_number::<u16>(args, "depth")?;
    if let Some(name) = args.get_one::<String>("endian") {
        options.byte_order = ByteOrder::from_name(name)?;
    }
    if let Some(name) = args.get_one::<String>("alpha") {
        options.alpha = parse_alpha(name);
    }
    if let Some(name) = args.get_one::<String>("type") {
        options.output_type = Some(OutputType::from_name(name)
            .ok_or_else(|| TiffError::GenericError(format!("Unknown output type: {}", name)))?);
    }
    if args.get_flag("float") {
        options.sample_type = SampleType::Float;
    }
    options.big_tiff = args.get_flag("bigtiff");
    options.pyramid = args.get_flag("pyramid");
    options.strip_per_page = args.get_flag("strip-per-page");
    options.adjoin = !args.get_flag("first-only");
    if let Some(&exif) = args.get_one::<bool>("exif") {
        options.write_exif = exif;
    }
    Ok(options)
}

impl<'a> ConvertCommand<'a> {
    /// Create a new convert command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new ConvertCommand instance or an error
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> TiffResult<Self> {
        let output_file = args.get_one::<String>("output")
            .ok_or_else(|| TiffError::GenericError("Missing output file path for conversion".to_string()))?
            .clone();

        let write_options = parse_write_options(args)?;
        info!("Using compression: {}", write_options.compression);

        Ok(ConvertCommand {
            input_file: input_file(args)?,
            output_file,
            read_options: read_options(args)?,
            write_options,
            config: load_config(args)?,
            show_progress: !args.get_flag("quiet"),
            logger,
        })
    }

    fn tracker(&self, description: &str) -> ProgressTracker {
        if self.show_progress {
            ProgressTracker::new(0, description)
        } else {
            ProgressTracker::hidden()
        }
    }

    fn report_warnings(&self, source: &str, warnings: &[Warning]) -> TiffResult<()> {
        let lines: Vec<String> = warnings.iter()
            .map(|w| {
                warn!("{} warning [{}]: {}", source, w.code, w.message);
                format!("[{}] {}", w.code, w.message)
            })
            .collect();
        self.logger.log_warnings(source, &lines)?;
        Ok(())
    }
}

impl<'a> Command for ConvertCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Converting file {} to {}", self.input_file, self.output_file);

        let decode_progress = self.tracker("Load image");
        let mut decode_context = DecodeContext::new(self.config.clone())
            .with_monitor(decode_progress.monitor());
        let stream = BufReader::new(File::open(&self.input_file)?);
        let outcome = decode(stream, &self.read_options, &mut decode_context)?;
        decode_progress.finish();
        self.report_warnings("decode", &outcome.warnings)?;
        info!("Decoded {} frame(s)", outcome.images.len());

        let encode_progress = self.tracker("Save image");
        let mut encode_context = EncodeContext::new(self.config.clone())
            .with_monitor(encode_progress.monitor());
        encode_file(&outcome.images, &self.output_file, &self.write_options, &mut encode_context)?;
        encode_progress.finish();
        let encode_warnings = encode_context.take_warnings();
        self.report_warnings("encode", &encode_warnings)?;

        info!("Conversion successful");
        self.logger.log(&format!("Converted {} to {} ({})",
                                 self.input_file, self.output_file, self.write_options.compression))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictor_names() {
        assert_eq!(parse_predictor("horizontal").unwrap(), predictor::HORIZONTAL);
        assert_eq!(parse_predictor("3").unwrap(), predictor::FLOATING_POINT);
        assert!(parse_predictor("diagonal").is_err());
    }
}
