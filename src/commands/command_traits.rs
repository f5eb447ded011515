//! Interfaces shared by the `analyze` and `convert` commands
//!
//! `main` asks a factory for the command matching the parsed flags and
//! runs it; each command reports failures as `TiffError`, so the exit
//! path and the log line look the same for both.

use crate::utils::logger::Logger;
use crate::tiff::errors::TiffResult;

/// One CLI action over a TIFF input
///
/// `AnalyzeCommand` prints the directory chain and the strategy each frame
/// would be decoded with; `ConvertCommand` decodes the input and encodes it
/// again with the requested layout and compression.
pub trait Command {
    /// Runs the action to completion
    fn execute(&self) -> TiffResult<()>;
}

/// Picks and builds the command for a set of parsed arguments
pub trait CommandFactory<'a> {
    /// Builds the command selected by `args`
    ///
    /// Option parsing happens here, so bad flags fail before any file is
    /// opened. The command borrows `logger` for its whole run.
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> TiffResult<Box<dyn Command + 'a>>;
}
