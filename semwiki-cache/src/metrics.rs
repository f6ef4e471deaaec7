//! Collector instrumentation
//!
//! Each collector name gets one [`CollectorMetrics`] in a shared
//! [`MetricsRegistry`], so cache effectiveness can be read across every
//! instance the store has handed out.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters for one collector
#[derive(Debug)]
pub struct CollectorMetrics {
    collector: String,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Cache reads or writes that failed and were treated as misses
    cache_failures: AtomicU64,
    executions: AtomicU64,
    total_compute_ns: AtomicU64,
}

impl CollectorMetrics {
    pub fn new(collector: impl Into<String>) -> Self {
        CollectorMetrics {
            collector: collector.into(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            cache_failures: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            total_compute_ns: AtomicU64::new(0),
        }
    }

    pub fn collector(&self) -> &str {
        &self.collector
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_failure(&self) {
        self.cache_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one run of the underlying computation
    pub fn record_execution(&self, duration: Duration) {
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.total_compute_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.cache_failures.store(0, Ordering::Relaxed);
        self.executions.store(0, Ordering::Relaxed);
        self.total_compute_ns.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            collector: self.collector.clone(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_failures: self.cache_failures.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            total_time_ns: self.total_compute_ns.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`CollectorMetrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub collector: String,
    pub hits: u64,
    pub misses: u64,
    pub cache_failures: u64,
    pub executions: u64,
    pub total_time_ns: u64,
}

impl MetricsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn avg_execution_time(&self) -> Duration {
        if self.executions == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_time_ns / self.executions)
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Collector: {}", self.collector)?;
        writeln!(
            f,
            "  Hits: {} | Misses: {} | Hit Rate: {:.1}%",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )?;
        if self.cache_failures > 0 {
            writeln!(f, "  Cache failures: {}", self.cache_failures)?;
        }
        writeln!(
            f,
            "  Executions: {} | Avg Time: {:.2}ms",
            self.executions,
            self.avg_execution_time().as_secs_f64() * 1000.0
        )?;
        Ok(())
    }
}

/// Shared per-collector metrics, keyed by collector name
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    collectors: DashMap<String, Arc<CollectorMetrics>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the metrics of a collector
    pub fn for_collector(&self, collector: &str) -> Arc<CollectorMetrics> {
        self.collectors
            .entry(collector.to_string())
            .or_insert_with(|| Arc::new(CollectorMetrics::new(collector)))
            .clone()
    }

    /// Snapshots of every collector seen so far, sorted by name
    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        let mut snapshots: Vec<_> = self.collectors.iter().map(|m| m.snapshot()).collect();
        snapshots.sort_by(|a, b| a.collector.cmp(&b.collector));
        snapshots
    }

    pub fn reset(&self) {
        for metrics in self.collectors.iter() {
            metrics.reset();
        }
    }
}
