//! Per-call state handed to every decode and encode
//!
//! The context carries the warning sink, the resource limiter, the
//! process configuration and the optional progress monitor. Usage counters
//! of the limiter are process-wide; limits from the configuration apply
//! to the one context only.

use std::fmt;
use log::{debug, info};

use crate::coder::limits::{ResourceKind, ResourceLimiter};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::warnings::{Warning, WarningContext, WarningPolicy};
use crate::utils::config::CoderConfig;

/// Progress callback: task, units done, units total. Returning false cancels.
pub type ProgressMonitor = Box<dyn FnMut(&str, u64, u64) -> bool>;

/// State of one decode or encode call
pub struct CoderContext {
    pub warnings: WarningContext,
    pub limiter: ResourceLimiter,
    pub config: CoderConfig,
    monitor: Option<ProgressMonitor>,
}

/// Context of a decode call
pub type DecodeContext = CoderContext;

/// Context of an encode call
pub type EncodeContext = CoderContext;

impl CoderContext {
    /// A context counting against the global limiter, narrowed by the configured limits
    pub fn new(config: CoderConfig) -> Self {
        let limiter = ResourceLimiter::global()
            .with_local_limit(ResourceKind::Memory, config.memory_limit)
            .with_local_limit(ResourceKind::Pixels, config.pixel_limit);
        CoderContext::with_limiter(config, limiter)
    }

    /// A context bound to a specific limiter
    pub fn with_limiter(config: CoderConfig, limiter: ResourceLimiter) -> Self {
        CoderContext {
            warnings: config.warning_context(),
            limiter,
            config,
            monitor: None,
        }
    }

    /// Installs a progress monitor
    pub fn with_monitor(mut self, monitor: ProgressMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Escalates every later codec warning to an error
    pub fn escalate_warnings(&mut self) {
        if self.warnings.policy() != WarningPolicy::Fatal {
            debug!("Codec warnings escalated to errors");
            let collected = self.warnings.take_warnings();
            self.warnings = WarningContext::new(WarningPolicy::Fatal, self.config.warning_strike_limit);
            for warning in collected {
                self.warnings.warn(&warning.code, warning.message);
            }
        }
    }

    /// Reports progress of one unit
    ///
    /// # Returns
    /// `Err(Cancelled)` when the monitor asks to stop
    pub fn report_progress(&mut self, task: &str, done: u64, total: u64) -> TiffResult<()> {
        if let Some(monitor) = self.monitor.as_mut() {
            if !monitor(task, done, total) {
                info!("{} cancelled at {}/{}", task, done, total);
                return Err(TiffError::Cancelled);
            }
        }
        Ok(())
    }

    /// Takes the warnings collected so far
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.warnings.take_warnings()
    }
}

impl Default for CoderContext {
    fn default() -> Self {
        CoderContext::new(CoderConfig::default())
    }
}

impl fmt::Debug for CoderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoderContext")
            .field("warnings", &self.warnings)
            .field("config", &self.config)
            .field("monitor", &self.monitor.is_some())
            .finish()
    }
}
