//! Bounded metrics history

use gatelattice_core::MetricsRecord;
use std::collections::VecDeque;
use std::fmt::Write;

/// Records kept when no window size is configured.
pub const DEFAULT_WINDOW: usize = 150;

/// Most recent `capacity` records in tick order. Oldest are evicted first.
#[derive(Clone, Debug)]
pub struct MetricsWindow {
    capacity: usize,
    records: VecDeque<MetricsRecord>,
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl MetricsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: MetricsRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&MetricsRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricsRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<MetricsRecord> {
        self.records.iter().cloned().collect()
    }

    /// `t,delta,energy` rows, energy to six decimals.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("t,delta,energy");
        for r in &self.records {
            let _ = write!(out, "\n{},{},{:.6}", r.tick, r.delta, r.energy);
        }
        out
    }

    /// Export name keyed by the newest tick in the window.
    pub fn export_file_name(&self) -> String {
        let last = self.latest().map(|r| r.tick).unwrap_or(0);
        format!("automaton_metrics_t{}.csv", last)
    }
}
