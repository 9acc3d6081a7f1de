//! Install metrics

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Receives install events; implementations must not block
pub trait MetricsSink: Send + Sync {
    fn record_install(&self, chart_name: &str, chart_version: &str);
}

/// Emits install events as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_install(&self, chart_name: &str, chart_version: &str) {
        tracing::info!(
            target: "chartgate::metrics",
            chart = chart_name,
            version = chart_version,
            "chart installed"
        );
    }
}

/// Counts install events per chart name and version
#[derive(Debug, Default)]
pub struct CountingMetrics {
    counts: Mutex<BTreeMap<(String, String), u64>>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, chart_name: &str, chart_version: &str) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(chart_name.to_string(), chart_version.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }
}

impl MetricsSink for CountingMetrics {
    fn record_install(&self, chart_name: &str, chart_version: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts
            .entry((chart_name.to_string(), chart_version.to_string()))
            .or_default() += 1;
    }
}

/// Record an install when the chart is identified by both name and version
pub(crate) fn emit(sink: &dyn MetricsSink, chart_name: &str, chart_version: &str) {
    if chart_name.is_empty() || chart_version.is_empty() {
        tracing::debug!(chart = chart_name, version = chart_version, "skipping install metric");
        return;
    }
    sink.record_install(chart_name, chart_version);
}
