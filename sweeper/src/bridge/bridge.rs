use crate::bridge::model::VisualizationModel;
use anyhow::Context;
use log::info;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
};
use sweepcore::prelude::RenderSink;
use sweepcore::spectrum::Snapshot;
use sweepcore::telemetry::TickCounters;
use tokio::task::JoinHandle;
use warp::Filter;

/// Render sink that keeps the latest spectrum for the HTTP endpoint.
///
/// Clones share the same state, so the runner can keep a handle for status
/// updates while the update loop owns another as its sink.
#[derive(Clone)]
pub struct SpectrumBridge {
    state: Arc<RwLock<VisualizationModel>>,
}

impl SpectrumBridge {
    pub fn new(plot_db_min: f32, plot_db_max: f32) -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::new(plot_db_min, plot_db_max))),
        }
    }

    /// Binds `addr` and serves `GET /spectrum` and `GET /health` on the current runtime.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());

        let spectrum_route = warp::path("spectrum")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<VisualizationModel>>| {
                let model = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&*model)
            });

        let health_route = warp::path("health")
            .and(warp::get())
            .map(|| warp::reply::json(&json!({"status": "ok"})));

        let (bound, server) = warp::serve(spectrum_route.or(health_route))
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding spectrum bridge on {}", addr))?;
        info!("[bridge] serving spectrum on http://{}/spectrum", bound);
        Ok((bound, tokio::spawn(server)))
    }

    pub fn publish_counters(&self, counters: TickCounters) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.counters = counters;
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.status = message.to_string();
    }

    #[cfg(test)]
    pub fn model(&self) -> VisualizationModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RenderSink for SpectrumBridge {
    fn render(&mut self, snapshot: &Snapshot) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let unchanged = guard
            .snapshot
            .as_ref()
            .map_or(false, |current| current.generation == snapshot.generation);
        if !unchanged {
            guard.snapshot = Some(snapshot.clone());
        }
    }
}
