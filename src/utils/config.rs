//! Process-level coder configuration
//!
//! Loaded from a TOML file with a `[coder]` table (a flat file works too).
//! Unknown keys are ignored and missing keys keep their defaults.

use std::fs;
use std::path::Path;
use log::{debug, warn};

use crate::tiff::constants::limits;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::warnings::{WarningContext, WarningPolicy};

/// Knobs shared by every decode and encode call
#[derive(Debug, Clone, PartialEq)]
pub struct CoderConfig {
    pub warning_policy: WarningPolicy,
    /// Repeats of one warning code before it is escalated
    pub warning_strike_limit: usize,
    /// Largest working buffer, as a multiple of the stream size
    pub max_compress_ratio: u64,
    /// Memory limit in bytes for working buffers
    pub memory_limit: Option<u64>,
    /// Largest frame, in pixels
    pub pixel_limit: Option<u64>,
    /// Uncompressed bytes per strip targeted by the writer
    pub bytes_per_strip: u64,
}

impl Default for CoderConfig {
    fn default() -> Self {
        CoderConfig {
            warning_policy: WarningPolicy::LogOnly,
            warning_strike_limit: 100,
            max_compress_ratio: limits::MAX_COMPRESS_RATIO,
            memory_limit: None,
            pixel_limit: None,
            bytes_per_strip: limits::BYTES_PER_STRIP,
        }
    }
}

impl CoderConfig {
    /// Reads a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TiffResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        debug!("Loading coder configuration from {}", path.as_ref().display());
        Self::from_str(&content)
    }

    /// Parses a configuration from TOML text
    pub fn from_str(content: &str) -> TiffResult<Self> {
        let value: toml::Value = content.parse()
            .map_err(|e| TiffError::GenericError(format!("Failed to parse configuration: {}", e)))?;
        let table = value.get("coder").unwrap_or(&value);

        let mut config = CoderConfig::default();
        if let Some(policy) = table.get("warning_policy").and_then(|v| v.as_str()) {
            match WarningPolicy::from_name(policy) {
                Some(policy) => config.warning_policy = policy,
                None => warn!("Unknown warning policy '{}', keeping {:?}", policy, config.warning_policy),
            }
        }
        let positive = |key: &str| table.get(key).and_then(|v| v.as_integer()).filter(|&v| v > 0).map(|v| v as u64);
        if let Some(limit) = positive("warning_strike_limit") {
            config.warning_strike_limit = limit as usize;
        }
        if let Some(ratio) = positive("max_compress_ratio") {
            config.max_compress_ratio = ratio;
        }
        if let Some(bytes) = positive("bytes_per_strip") {
            config.bytes_per_strip = bytes;
        }
        config.memory_limit = positive("memory_limit");
        config.pixel_limit = positive("pixel_limit");
        Ok(config)
    }

    /// A fresh warning sink configured with this policy
    pub fn warning_context(&self) -> WarningContext {
        WarningContext::new(self.warning_policy, self.warning_strike_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_file() {
        assert_eq!(CoderConfig::from_str("").unwrap(), CoderConfig::default());
    }

    #[test]
    fn test_coder_table() {
        let config = CoderConfig::from_str(r#"
            [coder]
            warning_policy = "fatal"
            max_compress_ratio = 50
            memory_limit = 1048576
            unknown_key = true
        "#).unwrap();
        assert_eq!(config.warning_policy, WarningPolicy::Fatal);
        assert_eq!(config.max_compress_ratio, 50);
        assert_eq!(config.memory_limit, Some(1048576));
        assert_eq!(config.bytes_per_strip, limits::BYTES_PER_STRIP);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(CoderConfig::from_str("warning_policy = ").is_err());
    }
}
