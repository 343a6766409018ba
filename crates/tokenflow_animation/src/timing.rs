//! Animation timing configuration

use crate::easing::Easing;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing of token animations
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Duration of a zero-length leg (ms)
    pub base_ms: u64,
    /// Added duration per unit of path length (ms)
    pub per_unit_ms: f32,
    /// Upper bound on any leg's duration (ms)
    pub max_ms: u64,
    /// Gap between the end of consumption and the start of production (ms)
    pub produce_delay_ms: u64,
    /// Progress at which a produce leg commits its token count
    pub produce_threshold: f32,
    /// Maximum tick rate; faster frames are skipped
    pub target_fps: u32,
    pub easing: Easing,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl TimingConfig {
    /// Standard timing for interactive use.
    pub fn standard() -> Self {
        Self {
            base_ms: 400,
            per_unit_ms: 2.0,
            max_ms: 1500,
            produce_delay_ms: 50,
            produce_threshold: 0.85,
            target_fps: 120,
            easing: Easing::FlowEdges,
        }
    }

    /// Fast timing for presentations of large nets.
    pub fn brisk() -> Self {
        Self {
            base_ms: 150,
            per_unit_ms: 0.75,
            max_ms: 600,
            produce_delay_ms: 20,
            ..Self::standard()
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_max_ms(mut self, max_ms: u64) -> Self {
        self.max_ms = max_ms;
        self
    }

    /// Leg duration for a path of the given length
    ///
    /// Always within `base_ms..=max_ms` and non-decreasing in `length`.
    pub fn duration_for(&self, length: f32) -> Duration {
        let base = self.base_ms as f32;
        let max = self.max_ms.max(self.base_ms) as f32;
        let ms = (base + length.max(0.0) * self.per_unit_ms.max(0.0)).min(max);
        Duration::from_secs_f32(ms / 1000.0)
    }

    pub fn produce_delay(&self) -> Duration {
        Duration::from_millis(self.produce_delay_ms)
    }

    /// Minimum spacing between processed ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps.max(1)))
    }
}
