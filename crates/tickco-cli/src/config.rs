// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Settings file for the CLI.
//!
//! ```json
//! {
//!   "interval_ms": 16,
//!   "url": "https://example.org/",
//!   "offline": true,
//!   "fetch_latency_ms": 300,
//!   "scheduler": { "catch_panics": true, "max_tick_delta": { "secs": 0, "nanos": 250000000 } }
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tickco_rt::SchedulerConfig;

use crate::demos::Source;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub scheduler: SchedulerConfig,
    pub interval_ms: u64,
    pub url: String,
    /// Simulate the fetch demo instead of hitting the network.
    pub offline: bool,
    pub fetch_latency_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            interval_ms: 16,
            url: "https://example.org/".to_string(),
            offline: false,
            fetch_latency_ms: 300,
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {}", path.display(), e))?;
        Self::parse(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn fetch_source(&self) -> Source {
        if self.offline {
            Source::Simulated {
                url: self.url.clone(),
                latency: Duration::from_millis(self.fetch_latency_ms),
            }
        } else {
            Source::Http(self.url.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let c = CliConfig::parse("{}").unwrap();
        assert_eq!(c.interval_ms, 16);
        assert_eq!(c.scheduler, SchedulerConfig::default());
    }

    #[test]
    fn partial_scheduler_section() {
        let c = CliConfig::parse(
            r#"{ "interval_ms": 5, "scheduler": { "catch_panics": false } }"#,
        )
        .unwrap();
        assert_eq!(c.interval(), Duration::from_millis(5));
        assert!(!c.scheduler.catch_panics);
        assert_eq!(c.scheduler.initial_capacity, 16);
    }

    #[test]
    fn offline_simulates_fetch() {
        let c = CliConfig::parse(r#"{ "offline": true, "fetch_latency_ms": 20 }"#).unwrap();
        match c.fetch_source() {
            Source::Simulated { latency, .. } => assert_eq!(latency, Duration::from_millis(20)),
            other => panic!("expected simulated source, got {:?}", other),
        }
        assert!(matches!(CliConfig::default().fetch_source(), Source::Http(_)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(CliConfig::parse("interval_ms = 5").is_err());
    }
}
