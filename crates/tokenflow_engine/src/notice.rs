//! Transient user-facing notices
//!
//! Messages expire on their own after a fixed lifetime; nothing has to
//! dismiss them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokenflow_animation::Clock;

/// Shown when a firing is requested while tokens are still moving
pub const ANIMATION_IN_PROGRESS: &str = "Animation in progress, please wait";

/// Shown when a firing is requested while a conflict awaits a decision
pub const CONFLICT_PENDING: &str = "Choose one of the conflicting transitions first";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: Duration,
}

pub struct NoticeBoard {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    notices: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            notices: VecDeque::new(),
        }
    }

    /// Show a message; repeating a visible message extends its lifetime
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        let expires_at = self.clock.now() + self.ttl;
        self.notices.retain(|n| n.message != message);
        self.notices.push_back(Notice {
            message,
            expires_at,
        });
    }

    /// Messages still visible, oldest first
    pub fn active(&mut self) -> Vec<String> {
        let now = self.clock.now();
        self.notices.retain(|n| n.expires_at > now);
        self.notices.iter().map(|n| n.message.clone()).collect()
    }
}
