//! Engine configuration
//!
//! One TOML document with a section per subsystem. Every section and every
//! field may be omitted.
//!
//! ```toml
//! [oracle]
//! process_endpoint = "http://localhost:8080/api"
//! page_id = "page-1"
//!
//! [engine]
//! deterministic_mode = true
//!
//! [timing]
//! max_ms = 1200
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokenflow_animation::TimingConfig;
use tokenflow_core::PathStyle;
use tokenflow_oracle::OracleConfig;

/// Firing behaviour
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Treat more than one enabled transition as a conflict to be resolved by the user
    pub deterministic_mode: bool,
    /// Lifetime of transient notices (ms)
    pub notice_ttl_ms: u64,
    /// Page title sent along with firing requests
    pub title: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            deterministic_mode: false,
            notice_ttl_ms: 2000,
            title: None,
        }
    }
}

impl EngineSettings {
    pub fn with_deterministic_mode(mut self, deterministic: bool) -> Self {
        self.deterministic_mode = deterministic;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub oracle: OracleConfig,
    pub engine: EngineSettings,
    pub timing: TimingConfig,
    pub path: PathStyle,
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
