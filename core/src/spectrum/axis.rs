use crate::prelude::{SweepError, SweepResult};
use serde::{Deserialize, Serialize};

const BIN_COUNT_TOLERANCE: f64 = 1e-9;
/// Upper bound on bins per axis; the full hackrf range at its finest width stays well below it.
const MAX_BIN_COUNT: usize = 1 << 24;

/// Fixed frequency grid the spectrum buffer is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAxis {
    min_freq_mhz: f64,
    max_freq_mhz: f64,
    bin_width_mhz: f64,
}

impl FrequencyAxis {
    pub fn new(min_freq_mhz: f64, max_freq_mhz: f64, bin_width_mhz: f64) -> SweepResult<Self> {
        if !(min_freq_mhz.is_finite() && max_freq_mhz.is_finite() && bin_width_mhz.is_finite()) {
            return Err(SweepError::InvalidAxis("bounds must be finite".into()));
        }
        if bin_width_mhz <= 0.0 {
            return Err(SweepError::InvalidAxis(format!(
                "bin width {} MHz must be positive",
                bin_width_mhz
            )));
        }
        if max_freq_mhz <= min_freq_mhz {
            return Err(SweepError::InvalidAxis(format!(
                "max {} MHz must exceed min {} MHz",
                max_freq_mhz, min_freq_mhz
            )));
        }

        let ratio = (max_freq_mhz - min_freq_mhz) / bin_width_mhz;
        if !ratio.is_finite() || ratio > MAX_BIN_COUNT as f64 {
            return Err(SweepError::InvalidAxis(format!(
                "span of {} MHz at {} MHz per bin exceeds {} bins",
                max_freq_mhz - min_freq_mhz,
                bin_width_mhz,
                MAX_BIN_COUNT
            )));
        }

        let axis = Self {
            min_freq_mhz,
            max_freq_mhz,
            bin_width_mhz,
        };
        if axis.bin_count() == 0 {
            return Err(SweepError::InvalidAxis(
                "span is narrower than a single bin".into(),
            ));
        }
        Ok(axis)
    }

    /// Builds the axis from a bin width given in Hz, as the sweep tool expects it.
    pub fn from_hz_bin_width(
        min_freq_mhz: f64,
        max_freq_mhz: f64,
        bin_width_hz: f64,
    ) -> SweepResult<Self> {
        Self::new(min_freq_mhz, max_freq_mhz, bin_width_hz / 1e6)
    }

    pub fn min_freq_mhz(&self) -> f64 {
        self.min_freq_mhz
    }

    pub fn max_freq_mhz(&self) -> f64 {
        self.max_freq_mhz
    }

    pub fn bin_width_mhz(&self) -> f64 {
        self.bin_width_mhz
    }

    /// `floor((max - min) / bin_width)`, tolerant of float noise just below an integer.
    pub fn bin_count(&self) -> usize {
        let ratio = (self.max_freq_mhz - self.min_freq_mhz) / self.bin_width_mhz;
        (ratio * (1.0 + BIN_COUNT_TOLERANCE)).floor() as usize
    }

    pub fn frequency_of(&self, index: usize) -> f64 {
        self.min_freq_mhz + index as f64 * self.bin_width_mhz
    }

    /// Nearest bin position for a frequency; may be negative or past the end.
    pub fn nearest_index(&self, freq_mhz: f64) -> i64 {
        ((freq_mhz - self.min_freq_mhz) / self.bin_width_mhz).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_counts_whole_bins() {
        let axis = FrequencyAxis::new(6000.0, 6100.0, 1.0).unwrap();
        assert_eq!(axis.bin_count(), 100);
        assert_eq!(axis.frequency_of(5), 6005.0);
    }

    #[test]
    fn axis_tolerates_fractional_bin_width() {
        let axis = FrequencyAxis::new(2400.0, 2500.0, 0.1).unwrap();
        assert_eq!(axis.bin_count(), 1000);
    }

    #[test]
    fn axis_floors_partial_last_bin() {
        let axis = FrequencyAxis::new(0.0, 10.5, 1.0).unwrap();
        assert_eq!(axis.bin_count(), 10);
    }

    #[test]
    fn axis_rejects_inverted_or_empty_span() {
        assert!(matches!(
            FrequencyAxis::new(6100.0, 6000.0, 1.0),
            Err(SweepError::InvalidAxis(_))
        ));
        assert!(FrequencyAxis::new(6000.0, 6000.5, 1.0).is_err());
        assert!(FrequencyAxis::new(6000.0, 6100.0, 0.0).is_err());
        assert!(FrequencyAxis::new(f64::NAN, 6100.0, 1.0).is_err());
    }

    #[test]
    fn axis_rejects_unbounded_bin_count() {
        assert!(matches!(
            FrequencyAxis::from_hz_bin_width(0.0, 1e15, 1e-6),
            Err(SweepError::InvalidAxis(_))
        ));
        assert!(FrequencyAxis::new(-f64::MAX, f64::MAX, 1.0).is_err());
        assert!(FrequencyAxis::new(0.0, 6000.0, 0.002445).is_ok());
    }

    #[test]
    fn axis_from_hz_converts_bin_width() {
        let axis = FrequencyAxis::from_hz_bin_width(6000.0, 6100.0, 500_000.0).unwrap();
        assert_eq!(axis.bin_width_mhz(), 0.5);
        assert_eq!(axis.bin_count(), 200);
    }

    #[test]
    fn nearest_index_rounds_and_allows_negative() {
        let axis = FrequencyAxis::new(6000.0, 6100.0, 1.0).unwrap();
        assert_eq!(axis.nearest_index(6004.6), 5);
        assert_eq!(axis.nearest_index(6004.4), 4);
        assert_eq!(axis.nearest_index(5000.0), -1000);
    }
}
