//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod convert_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use convert_command::ConvertCommand;

use clap::ArgMatches;

use crate::coder::options::parse_ignore_tags;
use crate::coder::ReadOptions;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::config::CoderConfig;
use crate::utils::logger::Logger;

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the command-line arguments and creates
/// the appropriate command instance for execution.
#[derive(Default)]
pub struct TiffcoderCommandFactory;

impl TiffcoderCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        TiffcoderCommandFactory
    }
}

impl<'a> CommandFactory<'a> for TiffcoderCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> TiffResult<Box<dyn Command + 'a>> {
        if args.get_flag("convert") {
            Ok(Box::new(ConvertCommand::new(args, logger)?))
        } else {
            // Default to analyze command
            Ok(Box::new(AnalyzeCommand::new(args, logger)?))
        }
    }
}

/// Input path shared by every command
pub(crate) fn input_file(args: &ArgMatches) -> TiffResult<String> {
    args.get_one::<String>("input")
        .cloned()
        .ok_or_else(|| TiffError::GenericError("Missing input file".to_string()))
}

/// Loads `--config` when given, otherwise the defaults
pub(crate) fn load_config(args: &ArgMatches) -> TiffResult<CoderConfig> {
    match args.get_one::<String>("config") {
        Some(path) => CoderConfig::from_file(path),
        None => Ok(CoderConfig::default()),
    }
}

/// Parses an optional numeric argument
pub(crate) fn parse_number<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> TiffResult<Option<T>> {
    match args.get_one::<String>(name) {
        Some(text) => text.trim().parse::<T>()
            .map(Some)
            .map_err(|_| TiffError::GenericError(format!("Invalid value for --{}: {}", name, text))),
        None => Ok(None),
    }
}

/// Decode options common to both commands
pub(crate) fn read_options(args: &ArgMatches) -> TiffResult<ReadOptions> {
    let mut options = ReadOptions::default();
    if let Some(list) = args.get_one::<String>("ignore-tags") {
        options.ignore_tags = parse_ignore_tags(list)?;
    }
    if let Some(subimage) = parse_number::<usize>(args, "subimage")? {
        options.subimage = subimage;
    }
    if let Some(subrange) = parse_number::<usize>(args, "subrange")? {
        options.subrange = subrange;
    }
    options.warnings_as_errors = args.get_flag("strict");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction};

    fn analyze_cli() -> clap::Command {
        let flag = |name: &'static str| Arg::new(name).long(name).action(ArgAction::SetTrue);
        let value = |name: &'static str| Arg::new(name).long(name);
        clap::Command::new("tiffcoder")
            .arg(Arg::new("input").required(true))
            .arg(flag("convert"))
            .arg(flag("verbose"))
            .arg(flag("strict"))
            .arg(value("config"))
            .arg(value("ignore-tags"))
            .arg(value("subimage"))
            .arg(value("subrange"))
    }

    #[test]
    fn test_factory_validates_flags_before_opening_input() {
        let logger = Logger::disabled();
        let factory = TiffcoderCommandFactory::new();

        let args = analyze_cli().get_matches_from(["tiffcoder", "missing.tif", "--subimage", "2"]);
        assert!(factory.create_command(&args, &logger).is_ok());

        let args = analyze_cli().get_matches_from(["tiffcoder", "missing.tif", "--subimage", "two"]);
        let err = factory.create_command(&args, &logger).err().unwrap();
        assert!(err.to_string().contains("--subimage"));
    }
}
