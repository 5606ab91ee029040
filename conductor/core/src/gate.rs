//! Busy Gate
//!
//! A single exclusive token. Whoever holds the [`BusyPermit`] owns the right
//! to run a transformation; the permit releases the gate when dropped, so
//! every exit path (success, error, panic unwind) leaves the gate open.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide single-flight gate
#[derive(Clone, Debug, Default)]
pub struct BusyGate {
    held: Arc<AtomicBool>,
}

impl BusyGate {
    /// Create an open gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate without waiting; `None` while someone else holds it
    #[must_use]
    pub fn try_acquire(&self) -> Option<BusyPermit> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyPermit {
                held: Arc::clone(&self.held),
            })
    }

    /// Whether the gate is currently held
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the gate
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct BusyPermit {
    held: Arc<AtomicBool>,
}

impl Drop for BusyPermit {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
