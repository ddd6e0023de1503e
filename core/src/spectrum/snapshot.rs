use crate::spectrum::axis::FrequencyAxis;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of the spectrum buffer handed to render sinks.
///
/// JSON has no encoding for `inf` or `NaN`, so non-finite amplitudes travel
/// as `null` and come back as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub axis: FrequencyAxis,
    #[serde(with = "amplitude_wire")]
    pub amplitudes_db: Vec<f32>,
    pub generation: u64,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.amplitudes_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes_db.is_empty()
    }

    pub fn frequencies_mhz(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| self.axis.frequency_of(i))
    }

    /// (frequency MHz, amplitude dB) pairs in ascending frequency order.
    pub fn points(&self) -> Vec<(f64, f32)> {
        self.frequencies_mhz()
            .zip(self.amplitudes_db.iter().copied())
            .collect()
    }

    /// Strongest bin, ignoring NaN amplitudes.
    pub fn peak(&self) -> Option<(f64, f32)> {
        self.points()
            .into_iter()
            .filter(|(_, db)| !db.is_nan())
            .fold(None, |best, point| match best {
                Some((_, best_db)) if best_db >= point.1 => best,
                _ => Some(point),
            })
    }
}

mod amplitude_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|db| db.is_finite().then_some(*db)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let values = Vec::<Option<f32>>::deserialize(deserializer)?;
        Ok(values
            .into_iter()
            .map(|db| db.unwrap_or(f32::NAN))
            .collect())
    }
}
