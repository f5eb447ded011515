//! Custom error types for TIFF coding
//!
//! Every fallible operation in the crate returns `TiffResult`. The variants
//! group into the categories reported by `TiffError::category`.

use std::fmt;
use std::io;

/// Broad classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or inconsistent directory contents, fatal for the frame
    Structural,
    /// An allocation or pixel-count limit was refused
    Resource,
    /// A codec warning escalated to an error
    CorruptData,
    /// Stream open/seek/read/write failure
    Io,
    /// The progress monitor asked to stop
    Cancelled,
}

/// TIFF-specific error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Directory contents are inconsistent or out of the supported range
    Structural(String),
    /// A resource limit refused an allocation
    ResourceLimit(String),
    /// A codec warning was escalated
    CorruptData(String),
    /// The caller cancelled the transfer
    Cancelled,
    /// Generic error with message
    GenericError(String),
}

impl TiffError {
    /// Returns the category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            TiffError::IoError(_) => ErrorCategory::Io,
            TiffError::ResourceLimit(_) => ErrorCategory::Resource,
            TiffError::CorruptData(_) => ErrorCategory::CorruptData,
            TiffError::Cancelled => ErrorCategory::Cancelled,
            _ => ErrorCategory::Structural,
        }
    }

    /// Shorthand for a structural error
    pub fn structural(message: impl Into<String>) -> Self {
        TiffError::Structural(message.into())
    }
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::InvalidHeader => write!(f, "Invalid TIFF header"),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::TagNotFound(tag) => write!(f, "Required tag not found: {}", tag),
            TiffError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            TiffError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            TiffError::MissingDimensions => write!(f, "Image dimensions not found"),
            TiffError::Structural(msg) => write!(f, "Corrupt image: {}", msg),
            TiffError::ResourceLimit(msg) => write!(f, "Resource limit exceeded: {}", msg),
            TiffError::CorruptData(msg) => write!(f, "Corrupt data: {}", msg),
            TiffError::Cancelled => write!(f, "Operation cancelled"),
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TiffError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(TiffError::Cancelled.category(), ErrorCategory::Cancelled);
        assert_eq!(TiffError::ResourceLimit("x".into()).category(), ErrorCategory::Resource);
        assert_eq!(TiffError::TagNotFound(256).category(), ErrorCategory::Structural);
        let io = TiffError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(io.category(), ErrorCategory::Io);
    }
}
