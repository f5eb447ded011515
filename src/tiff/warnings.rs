//! Warning collection for directory parsing and chunk decoding
//!
//! Codec warnings (a skipped entry, a short chunk) pass through a policy:
//! logged only, logged and collected, or escalated to `CorruptData`. A
//! warning code repeating more than the strike limit is escalated
//! regardless of policy. Coder-level warnings (a dropped frame, a dropped
//! alpha channel) are always collected.

use std::collections::HashMap;
use log::warn;

use crate::tiff::errors::{TiffError, TiffResult};

/// How codec warnings are surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Log the warning and continue
    LogOnly,
    /// Log the warning and add it to the warning list
    Report,
    /// Treat the warning as an error
    Fatal,
}

impl WarningPolicy {
    /// Parses "log", "report" or "fatal"
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "log" | "log-only" => Some(WarningPolicy::LogOnly),
            "report" => Some(WarningPolicy::Report),
            "fatal" | "error" => Some(WarningPolicy::Fatal),
            _ => None,
        }
    }
}

/// One recorded warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Short machine-readable code, e.g. "short-chunk"
    pub code: String,
    /// Human-readable reason
    pub message: String,
}

/// Explicit warning sink passed into every parse and decode call
#[derive(Debug)]
pub struct WarningContext {
    policy: WarningPolicy,
    strike_limit: usize,
    strikes: HashMap<String, usize>,
    warnings: Vec<Warning>,
}

impl Default for WarningContext {
    fn default() -> Self {
        WarningContext::new(WarningPolicy::LogOnly, 100)
    }
}

impl WarningContext {
    /// Creates a context with the given policy and strike limit
    pub fn new(policy: WarningPolicy, strike_limit: usize) -> Self {
        WarningContext {
            policy,
            strike_limit,
            strikes: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// The active policy
    pub fn policy(&self) -> WarningPolicy {
        self.policy
    }

    /// Records a codec-level warning
    ///
    /// # Returns
    /// `Err(CorruptData)` when the policy is fatal or the code exceeded
    /// the strike limit, otherwise `Ok(())`
    pub fn codec_warning(&mut self, code: &str, message: String) -> TiffResult<()> {
        warn!("{}: {}", code, message);

        let strikes = self.strikes.entry(code.to_string()).or_insert(0);
        *strikes += 1;
        if *strikes > self.strike_limit {
            return Err(TiffError::CorruptData(format!(
                "{} (warning '{}' repeated more than {} times)", message, code, self.strike_limit)));
        }

        match self.policy {
            WarningPolicy::LogOnly => Ok(()),
            WarningPolicy::Report => {
                self.push(code, message);
                Ok(())
            },
            WarningPolicy::Fatal => Err(TiffError::CorruptData(message)),
        }
    }

    /// Records a coder-level warning; always collected
    pub fn warn(&mut self, code: &str, message: String) {
        warn!("{}: {}", code, message);
        self.push(code, message);
    }

    fn push(&mut self, code: &str, message: String) {
        self.warnings.push(Warning { code: code.to_string(), message });
    }

    /// Warnings collected so far
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Takes the collected warnings, leaving the list empty
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_only_does_not_collect() {
        let mut ctx = WarningContext::default();
        assert!(ctx.codec_warning("short-chunk", "strip 0 short".into()).is_ok());
        assert!(ctx.warnings().is_empty());
        ctx.warn("frame-dropped", "frame 1".into());
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_report_collects() {
        let mut ctx = WarningContext::new(WarningPolicy::Report, 10);
        ctx.codec_warning("duplicate-tag", "tag 256".into()).unwrap();
        assert_eq!(ctx.warnings()[0].code, "duplicate-tag");
    }

    #[test]
    fn test_strike_limit_escalates() {
        let mut ctx = WarningContext::new(WarningPolicy::LogOnly, 2);
        assert!(ctx.codec_warning("x", "a".into()).is_ok());
        assert!(ctx.codec_warning("x", "b".into()).is_ok());
        let err = ctx.codec_warning("x", "c".into()).unwrap_err();
        assert!(matches!(err, TiffError::CorruptData(_)));
        // other codes are counted separately
        assert!(ctx.codec_warning("y", "d".into()).is_ok());
    }

    #[test]
    fn test_fatal_policy() {
        let mut ctx = WarningContext::new(WarningPolicy::Fatal, 100);
        assert!(ctx.codec_warning("x", "a".into()).is_err());
    }
}
