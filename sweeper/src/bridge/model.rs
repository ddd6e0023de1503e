use serde::{Deserialize, Serialize};
use sweepcore::spectrum::Snapshot;
use sweepcore::telemetry::TickCounters;

/// JSON body served on `GET /spectrum`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub snapshot: Option<Snapshot>,
    pub plot_db_min: f32,
    pub plot_db_max: f32,
    pub counters: TickCounters,
    pub status: String,
}

impl VisualizationModel {
    pub fn new(plot_db_min: f32, plot_db_max: f32) -> Self {
        Self {
            plot_db_min,
            plot_db_max,
            status: "waiting for sweep data".into(),
            ..Default::default()
        }
    }
}
