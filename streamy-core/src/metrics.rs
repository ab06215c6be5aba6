// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Minimal in-process counters for step outcomes and durations. No HTTP
//! exporter lives here; exposing an endpoint is an outer surface this crate
//! doesn't own. Counters are plain atomics so the executor can update them
//! from any worker without contention on a shared lock.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ExecutorMetrics {
    pub steps_evaluated: AtomicU64,
    pub steps_applied: AtomicU64,
    pub steps_failed: AtomicU64,
    pub steps_skipped: AtomicU64,
    pub total_duration_micros: AtomicU64,
}

impl ExecutorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_evaluated(&self) {
        self.steps_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self, duration: std::time::Duration) {
        self.steps_applied.fetch_add(1, Ordering::Relaxed);
        self.total_duration_micros.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.steps_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.steps_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            steps_evaluated: self.steps_evaluated.load(Ordering::Relaxed),
            steps_applied: self.steps_applied.load(Ordering::Relaxed),
            steps_failed: self.steps_failed.load(Ordering::Relaxed),
            steps_skipped: self.steps_skipped.load(Ordering::Relaxed),
            total_duration_micros: self.total_duration_micros.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub steps_evaluated: u64,
    pub steps_applied: u64,
    pub steps_failed: u64,
    pub steps_skipped: u64,
    pub total_duration_micros: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = ExecutorMetrics::new();
        metrics.record_evaluated();
        metrics.record_failed();
        metrics.record_failed();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.steps_evaluated, 1);
        assert_eq!(snapshot.steps_failed, 2);
    }
}
