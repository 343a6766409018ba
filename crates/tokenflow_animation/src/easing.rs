//! Easing curves mapping elapsed fraction to progress

use serde::{Deserialize, Serialize};

/// Length of the eased lead-in and lead-out, as a fraction of the duration
const EDGE: f32 = 0.1;

/// Easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Quadratic ease-in over the first 10%, constant speed through the
    /// middle, quadratic ease-out over the last 10%
    #[default]
    FlowEdges,
}

impl Easing {
    /// Progress for an elapsed fraction `t`, both in 0.0..=1.0
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::FlowEdges => {
                // Trapezoidal velocity: accelerate, cruise, decelerate.
                // The cruise speed makes the total area exactly 1.
                let cruise = 1.0 / (1.0 - EDGE);
                if t < EDGE {
                    cruise * t * t / (2.0 * EDGE)
                } else if t <= 1.0 - EDGE {
                    cruise * (EDGE / 2.0 + (t - EDGE))
                } else {
                    let rest = 1.0 - t;
                    1.0 - cruise * rest * rest / (2.0 * EDGE)
                }
            }
        }
    }
}
