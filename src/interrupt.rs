//! Cooperative cancellation shared by the driver, its tasks and the locked registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A clonable cancellation flag.
///
/// Raising is one-way: once raised it stays raised. Every clone observes
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    /// Create a flag that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Waiters notice at their next poll.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Whether [`raise`](Self::raise) has been called on any clone.
    #[must_use]
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
