use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Per-outcome tick counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounters {
    pub ticks: u64,
    pub applied: u64,
    pub skipped: u64,
    pub idle: u64,
    pub malformed: u64,
    pub out_of_range: u64,
}

impl TickCounters {
    pub fn errors(&self) -> u64 {
        self.malformed + self.out_of_range
    }
}

pub struct MetricsRecorder {
    inner: Mutex<TickCounters>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TickCounters::default()),
        }
    }

    fn bump(&self, update: impl FnOnce(&mut TickCounters)) {
        if let Ok(mut counters) = self.inner.lock() {
            update(&mut counters);
        }
    }

    pub fn record_tick(&self) {
        self.bump(|c| c.ticks += 1);
    }

    pub fn record_applied(&self) {
        self.bump(|c| c.applied += 1);
    }

    pub fn record_skipped(&self) {
        self.bump(|c| c.skipped += 1);
    }

    pub fn record_idle(&self) {
        self.bump(|c| c.idle += 1);
    }

    pub fn record_malformed(&self) {
        self.bump(|c| c.malformed += 1);
    }

    pub fn record_out_of_range(&self) {
        self.bump(|c| c.out_of_range += 1);
    }

    pub fn snapshot(&self) -> TickCounters {
        if let Ok(counters) = self.inner.lock() {
            *counters
        } else {
            TickCounters::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_each_outcome() {
        let metrics = MetricsRecorder::new();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_applied();
        metrics.record_malformed();
        metrics.record_out_of_range();

        let counters = metrics.snapshot();
        assert_eq!(counters.ticks, 2);
        assert_eq!(counters.applied, 1);
        assert_eq!(counters.errors(), 2);
    }
}
