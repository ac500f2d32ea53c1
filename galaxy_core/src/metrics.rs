//! Per-step timing and counter collection.
//!
//! Metrics are ephemeral: created when a step starts, folded into the
//! final [`GenerationReport`], never persisted.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use galaxy_schema::{GalaxyId, GalaxyStatistics, GalaxyStatus, SizeTier};

/// Wall-clock and counter tracking for one generation step (or a whole
/// run). The clock starts on construction.
#[derive(Debug, Clone)]
pub struct GenerationMetrics {
    started: Instant,
    elapsed: Option<Duration>,
    counts: BTreeMap<String, u64>,
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            elapsed: None,
            counts: BTreeMap::new(),
        }
    }

    /// Freeze the clock. Further elapsed queries return the frozen value.
    pub fn complete(&mut self) {
        self.elapsed = Some(self.started.elapsed());
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn set_count(&mut self, key: &str, value: u64) {
        self.counts.insert(key.to_string(), value);
    }

    pub fn increment(&mut self, key: &str, amount: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += amount;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

/// Outcome of a single pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub success: bool,
    pub elapsed_ms: u64,
    pub counts: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn success(name: &str, metrics: &GenerationMetrics) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            elapsed_ms: metrics.elapsed_ms(),
            counts: metrics.counts().clone(),
            error: None,
        }
    }

    pub fn failure(name: &str, metrics: &GenerationMetrics, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            elapsed_ms: metrics.elapsed_ms(),
            counts: metrics.counts().clone(),
            error: Some(error),
        }
    }
}

/// Identity block for a generated galaxy in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct GalaxySummary {
    pub id: GalaxyId,
    pub name: String,
    pub tier: SizeTier,
    pub width: u32,
    pub height: u32,
    pub status: GalaxyStatus,
}

/// The structured result of one generation run, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub galaxy: Option<GalaxySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_galaxy: Option<GalaxySummary>,
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<GalaxyStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut metrics = GenerationMetrics::new();
        metrics.set_count("stars", 10);
        metrics.increment("stars", 5);
        metrics.increment("gates", 2);
        assert_eq!(metrics.count("stars"), 15);
        assert_eq!(metrics.count("gates"), 2);
        assert_eq!(metrics.count("missing"), 0);
    }

    #[test]
    fn complete_freezes_elapsed() {
        let mut metrics = GenerationMetrics::new();
        metrics.complete();
        let first = metrics.elapsed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(metrics.elapsed(), first);
    }

    #[test]
    fn step_report_carries_counts_and_error() {
        let mut metrics = GenerationMetrics::new();
        metrics.set_count("rows", 3);
        metrics.complete();

        let ok = StepReport::success("star_field", &metrics);
        assert!(ok.success);
        assert_eq!(ok.counts.get("rows"), Some(&3));
        assert!(ok.error.is_none());

        let failed = StepReport::failure("star_field", &metrics, "store unavailable".into());
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("store unavailable"));
    }
}
