//! TIFF structure analysis command
//!
//! This module implements the command that walks a file's directory
//! chain, lists each directory's tags by name and pings every frame
//! through the coder to show the decoded geometry and the transfer
//! strategy the reader would use.

use std::fs::File;
use std::io::BufReader;
use clap::ArgMatches;
use log::{debug, info, warn};

use crate::coder::{decode, DecodeContext, ReadOptions, STRATEGY_ATTRIBUTE};
use crate::commands::command_traits::Command;
use crate::commands::{input_file, load_config, read_options};
use crate::model::{Image, StorageClass};
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReaderBuilder;
use crate::tiff::types::TIFF;
use crate::tiff::warnings::Warning;
use crate::utils::config::CoderConfig;
use crate::utils::logger::Logger;
use crate::utils::tiff_code_translators::compression_code_to_name;

/// Tags listed per directory unless verbose
const SUMMARY_TAGS: usize = 10;

/// Command for analyzing TIFF file structure
pub struct AnalyzeCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// List every tag instead of the first few
    verbose: bool,
    /// Tag filter and frame range for the ping pass
    read_options: ReadOptions,
    config: CoderConfig,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> AnalyzeCommand<'a> {
    /// Create a new analyze command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new AnalyzeCommand instance or an error
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> TiffResult<Self> {
        let mut read_options = read_options(args)?;
        read_options.ping = true;

        Ok(AnalyzeCommand {
            input_file: input_file(args)?,
            verbose: args.get_flag("verbose"),
            read_options,
            config: load_config(args)?,
            logger,
        })
    }

    /// Shows the container format and the length of the directory chain
    fn display_tiff_summary(&self, tiff: &TIFF) {
        info!("TIFF Analysis Results:");
        info!("  Format: {}", if tiff.is_big_tiff { "BigTIFF" } else { "TIFF" });
        info!("  Byte order: {}", tiff.byte_order.name());
        info!("  Number of IFDs: {}", tiff.ifd_count());
    }

    /// Shows where a directory sits in the chain and its basic geometry
    fn display_ifd_summary(&self, ifd: &IFD, index: usize) {
        info!("\nIFD #{} (offset: {}, next: {})", index, ifd.offset, ifd.next_offset);
        info!("  Number of entries: {}", ifd.entries.len());

        match ifd.get_dimensions() {
            Some((width, height)) => info!("  Dimensions: {}x{}", width, height),
            None => info!("  Dimensions: Not available"),
        }
        info!("  Samples per pixel: {}", ifd.get_samples_per_pixel());
        info!("  Layout: {}", if ifd.is_tiled() { "tiled" } else { "stripped" });

        if let Some(code) = ifd.get_u64(tags::COMPRESSION) {
            info!("  Compression: {} ({})", code, compression_code_to_name(code));
        }
        if let Some(value) = ifd.get_u64(tags::NEW_SUBFILE_TYPE) {
            info!("  NewSubfileType: {}", value);
            if value & 1 == 1 {
                info!("    (Reduced resolution version)");
            }
        }
    }

    /// Lists the directory's tags by name
    fn display_tags(&self, ifd: &IFD) {
        let shown = if self.verbose { ifd.entries.len() } else { ifd.entries.len().min(SUMMARY_TAGS) };
        info!("  Tags:");
        for entry in ifd.entries.iter().take(shown) {
            info!("    {}", entry.description(ifd.byte_order));
        }
        if ifd.entries.len() > shown {
            info!("    ... ({} more tags, use --verbose to list all)", ifd.entries.len() - shown);
        }
    }

    /// Shows what the reader made of one frame
    fn display_frame(&self, image: &Image) {
        info!("\nFrame #{}", image.scene);
        info!("  Geometry: {}x{}, depth {}", image.columns, image.rows, image.depth);
        info!("  Colorspace: {:?}{}", image.colorspace, if image.matte { " with alpha" } else { "" });
        match image.storage_class {
            StorageClass::Palette => info!("  Class: palette, {} colors", image.colormap.len()),
            StorageClass::Direct => info!("  Class: direct"),
        }
        info!("  Compression: {}", image.compression);
        if image.x_resolution > 0.0 || image.y_resolution > 0.0 {
            info!("  Resolution: {}x{} ({:?})", image.x_resolution, image.y_resolution, image.units);
        }
        info!("  Strategy: {}", image.attribute(STRATEGY_ATTRIBUTE).unwrap_or("not selectable"));
        for (name, value) in image.attributes.iter().filter(|(name, _)| name.as_str() != STRATEGY_ATTRIBUTE) {
            debug!("  Attribute {}: {}", name, value);
        }
        for (name, profile) in &image.profiles {
            info!("  Profile {}: {} bytes", name, profile.len());
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

impl<'a> Command for AnalyzeCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        info!("Analyzing file: {}", self.input_file);

        let mut warnings = self.config.warning_context();
        let mut reader = TiffReaderBuilder::new()
            .ignore_tags(&self.read_options.ignore_tags)
            .build();
        let tiff = reader.load(&self.input_file, &mut warnings)?;
        self.report_warnings("directory", warnings.warnings())?;

        self.display_tiff_summary(&tiff);
        for (i, ifd) in tiff.ifds.iter().enumerate() {
            self.display_ifd_summary(ifd, i);
            self.display_tags(ifd);
        }

        let stream = BufReader::new(File::open(&self.input_file)?);
        let mut context = DecodeContext::new(self.config.clone());
        match decode(stream, &self.read_options, &mut context) {
            Ok(outcome) => {
                for image in &outcome.images {
                    self.display_frame(image);
                }
                self.report_warnings("decode", &outcome.warnings)?;
            },
            Err(e) => warn!("Frames could not be pinged: {}", e),
        }

        debug!("Analysis completed successfully");
        self.logger.log(&format!("Analyzed {}: {} directories", self.input_file, tiff.ifd_count()))?;

        Ok(())
    }
}
