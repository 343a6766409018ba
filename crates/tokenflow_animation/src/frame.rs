//! Frame sources
//!
//! The scheduler asks its host for a frame whenever it has live records and
//! withdraws the request when it is cleared. The host answers by calling
//! `on_frame` once per display frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Host facility that delivers frame callbacks on request
pub trait FrameSource: Send + Sync {
    /// Ask for one more frame callback
    fn request_frame(&self);

    /// Withdraw an outstanding frame request
    fn cancel_frame(&self);
}

/// Polled frame request flag
///
/// A host loop checks and clears the flag with [`FrameSignal::take`], then
/// calls the scheduler's `on_frame`. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct FrameSignal {
    pending: Arc<AtomicBool>,
}

impl FrameSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and clear the pending request in one operation
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }

    /// Check the pending request without clearing it
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Relaxed)
    }
}

impl FrameSource for FrameSignal {
    fn request_frame(&self) {
        self.pending.store(true, Ordering::Release);
    }

    fn cancel_frame(&self) {
        self.pending.store(false, Ordering::Release);
    }
}
