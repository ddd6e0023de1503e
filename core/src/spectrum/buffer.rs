use crate::prelude::{SweepError, SweepResult};
use crate::segment::Segment;
use crate::spectrum::axis::FrequencyAxis;
use crate::spectrum::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// Half-open bin range written by a single `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRange {
    pub start_idx: usize,
    pub end_idx: usize,
    /// Amplitudes dropped because they fell outside the axis.
    pub truncated: usize,
}

impl AppliedRange {
    pub fn len(&self) -> usize {
        self.end_idx - self.start_idx
    }

    pub fn is_empty(&self) -> bool {
        self.start_idx == self.end_idx
    }
}

/// Persistent amplitude array, one value per axis bin.
///
/// Bins start at the configured floor and afterwards always hold the most
/// recently applied amplitude for their frequency. The length never changes.
#[derive(Debug, Clone)]
pub struct SpectrumBuffer {
    axis: FrequencyAxis,
    floor_db: f32,
    bins: Vec<f32>,
    generation: u64,
}

impl SpectrumBuffer {
    pub fn new(axis: FrequencyAxis, floor_db: f32) -> Self {
        Self {
            axis,
            floor_db,
            bins: vec![floor_db; axis.bin_count()],
            generation: 0,
        }
    }

    pub fn axis(&self) -> &FrequencyAxis {
        &self.axis
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn amplitudes(&self) -> &[f32] {
        &self.bins
    }

    /// Overwrites the bins covered by `segment`, truncating whatever lies off the axis.
    pub fn apply(&mut self, segment: &Segment) -> SweepResult<AppliedRange> {
        let bin_count = self.bins.len();
        let start_idx = self.axis.nearest_index(segment.start_freq_mhz);
        let end_idx = start_idx.saturating_add(segment.amplitudes_db.len() as i64);

        if end_idx <= 0 || start_idx >= bin_count as i64 {
            return Err(SweepError::OutOfRange {
                start_idx,
                end_idx,
                bin_count,
            });
        }

        let lo = start_idx.max(0) as usize;
        let hi = end_idx.min(bin_count as i64) as usize;
        let offset = (lo as i64 - start_idx) as usize;
        let written = hi - lo;

        if written > 0 {
            self.bins[lo..hi].copy_from_slice(&segment.amplitudes_db[offset..offset + written]);
            self.generation += 1;
        }

        Ok(AppliedRange {
            start_idx: lo,
            end_idx: hi,
            truncated: segment.amplitudes_db.len() - written,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            axis: self.axis,
            amplitudes_db: self.bins.clone(),
            generation: self.generation,
        }
    }
}
