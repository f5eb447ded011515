//! Resource accounting for working buffers
//!
//! Every scanline, strip and tile buffer, palette and pixel buffer is
//! reserved here before it is allocated. A refusal surfaces as
//! `TiffError::ResourceLimit`; nothing is silently truncated.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use lazy_static::lazy_static;
use log::{debug, trace};

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::validation::round_up_to_word;

/// Kinds of resources that can be limited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Memory,
    Disk,
    Map,
    Pixels,
}

#[derive(Debug, Default)]
struct LimiterState {
    limits: HashMap<ResourceKind, u64>,
    usage: HashMap<ResourceKind, u64>,
}

lazy_static! {
    static ref GLOBAL_LIMITER: ResourceLimiter = ResourceLimiter::new();
}

/// Shared resource accountant; clones refer to the same counters
///
/// A handle may also carry limits of its own. They narrow the shared
/// limits for that handle and its clones only, while usage is still
/// counted in the shared state.
#[derive(Debug, Clone, Default)]
pub struct ResourceLimiter {
    state: Arc<Mutex<LimiterState>>,
    local_limits: Arc<HashMap<ResourceKind, u64>>,
}

impl ResourceLimiter {
    /// An unlimited, private limiter
    pub fn new() -> Self {
        ResourceLimiter::default()
    }

    /// The process-wide limiter
    pub fn global() -> Self {
        GLOBAL_LIMITER.clone()
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        // A panic while holding the lock leaves the counters usable
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A handle on the same counters with `limit` applied to it alone
    pub fn with_local_limit(&self, kind: ResourceKind, limit: Option<u64>) -> Self {
        let mut local_limits = (*self.local_limits).clone();
        match limit {
            Some(limit) => local_limits.insert(kind, limit),
            None => local_limits.remove(&kind),
        };
        ResourceLimiter { state: Arc::clone(&self.state), local_limits: Arc::new(local_limits) }
    }

    fn effective_limit(&self, state: &LimiterState, kind: ResourceKind) -> Option<u64> {
        match (state.limits.get(&kind), self.local_limits.get(&kind)) {
            (Some(&shared), Some(&local)) => Some(shared.min(local)),
            (shared, local) => shared.or(local).copied(),
        }
    }

    /// Sets the shared limit for a kind; `None` removes it
    pub fn set_limit(&self, kind: ResourceKind, limit: Option<u64>) {
        let mut state = self.lock();
        match limit {
            Some(limit) => state.limits.insert(kind, limit),
            None => state.limits.remove(&kind),
        };
    }

    /// The limit in force for a kind, if any
    pub fn limit(&self, kind: ResourceKind) -> Option<u64> {
        let state = self.lock();
        self.effective_limit(&state, kind)
    }

    /// Amount currently reserved
    pub fn usage(&self, kind: ResourceKind) -> u64 {
        self.lock().usage.get(&kind).copied().unwrap_or(0)
    }

    /// Reserves `amount`; returns false when that would exceed the limit
    pub fn acquire(&self, kind: ResourceKind, amount: u64) -> bool {
        let mut state = self.lock();
        let used = state.usage.get(&kind).copied().unwrap_or(0);
        let wanted = used.saturating_add(amount);
        if let Some(limit) = self.effective_limit(&state, kind) {
            if wanted > limit {
                debug!("Refused {:?} reservation of {} ({} in use, limit {})", kind, amount, used, limit);
                return false;
            }
        }
        state.usage.insert(kind, wanted);
        trace!("Reserved {} of {:?}, {} in use", amount, kind, wanted);
        true
    }

    /// Returns a reservation
    pub fn release(&self, kind: ResourceKind, amount: u64) {
        let mut state = self.lock();
        let used = state.usage.entry(kind).or_insert(0);
        *used = used.saturating_sub(amount);
    }

    /// Checks a one-off amount against the limit without reserving it
    pub fn check(&self, kind: ResourceKind, amount: u64) -> TiffResult<()> {
        match self.limit(kind) {
            Some(limit) if amount > limit => Err(TiffError::ResourceLimit(format!(
                "{:?} request of {} exceeds the limit of {}", kind, amount, limit))),
            _ => Ok(()),
        }
    }
}

/// Zero-filled working buffer whose memory is reserved with a limiter
///
/// The size is rounded up to a 4-byte multiple. The reservation is
/// returned when the buffer is dropped.
#[derive(Debug)]
pub struct LimitedBuffer {
    data: Vec<u8>,
    reserved: u64,
    limiter: ResourceLimiter,
}

impl LimitedBuffer {
    /// Reserves and allocates a buffer of at least `size` bytes
    pub fn new(limiter: &ResourceLimiter, size: u64) -> TiffResult<Self> {
        let reserved = round_up_to_word(size);
        if !limiter.acquire(ResourceKind::Memory, reserved) {
            return Err(TiffError::ResourceLimit(format!(
                "Memory allocation of {} bytes refused", reserved)));
        }
        let length = match usize::try_from(reserved) {
            Ok(length) => length,
            Err(_) => {
                limiter.release(ResourceKind::Memory, reserved);
                return Err(TiffError::ResourceLimit(format!("Buffer of {} bytes is not addressable", reserved)));
            }
        };
        Ok(LimitedBuffer { data: vec![0u8; length], reserved, limiter: limiter.clone() })
    }

    /// Resets the contents to zero
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

impl Deref for LimitedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for LimitedBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for LimitedBuffer {
    fn drop(&mut self) {
        self.limiter.release(ResourceKind::Memory, self.reserved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_reservation_released_on_drop() {
        let limiter = ResourceLimiter::new();
        limiter.set_limit(ResourceKind::Memory, Some(16));
        {
            let buffer = LimitedBuffer::new(&limiter, 10).unwrap();
            assert_eq!(buffer.len(), 12);
            assert_eq!(limiter.usage(ResourceKind::Memory), 12);
            assert!(LimitedBuffer::new(&limiter, 8).is_err());
        }
        assert_eq!(limiter.usage(ResourceKind::Memory), 0);
        assert!(LimitedBuffer::new(&limiter, 16).is_ok());
    }

    #[test]
    fn test_pixel_check() {
        let limiter = ResourceLimiter::new();
        assert!(limiter.check(ResourceKind::Pixels, u64::MAX).is_ok());
        limiter.set_limit(ResourceKind::Pixels, Some(100));
        let err = limiter.check(ResourceKind::Pixels, 101).unwrap_err();
        assert!(matches!(err, TiffError::ResourceLimit(_)));
    }

    #[test]
    fn test_local_limit_leaves_shared_handle_alone() {
        let shared = ResourceLimiter::new();
        let local = shared.with_local_limit(ResourceKind::Memory, Some(64));
        assert_eq!(local.limit(ResourceKind::Memory), Some(64));
        assert_eq!(shared.limit(ResourceKind::Memory), None);

        let buffer = LimitedBuffer::new(&local, 40).unwrap();
        assert_eq!(shared.usage(ResourceKind::Memory), 40);
        assert!(LimitedBuffer::new(&local, 40).is_err());
        assert!(LimitedBuffer::new(&shared, 4096).is_ok());
        drop(buffer);

        shared.set_limit(ResourceKind::Memory, Some(32));
        assert_eq!(local.limit(ResourceKind::Memory), Some(32));
    }
}
