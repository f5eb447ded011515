//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for handling different compression methods
///
/// Handlers work on one strip or tile at a time. Predictor and fill
/// order are applied around them by the chunk codec.
pub trait CompressionHandler: Send + Sync {
    /// Decompress the data
    ///
    /// Output stops at `expected` bytes, the decoded size of the chunk;
    /// anything a stream would inflate past that is never materialized.
    fn decompress(&self, data: &[u8], expected: usize) -> TiffResult<Vec<u8>>;

    /// Compress the data
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}
