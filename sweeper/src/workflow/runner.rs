use crate::bridge::bridge::SpectrumBridge;
use crate::workflow::config::SweepConfig;
use anyhow::Context;
use log::info;
use std::future::Future;
use sweepcore::prelude::{RenderSink, SweepSource};
use sweepcore::telemetry::TickCounters;
use sweepcore::update::UpdateLoop;
use tokio::time::{self, MissedTickBehavior};

/// End-of-run figures for reports and the console.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counters: TickCounters,
    pub bin_count: usize,
    pub generation: u64,
    pub peak: Option<(f64, f32)>,
    /// True when the run stopped because the source ran dry rather than on request.
    pub source_ended: bool,
}

impl RunSummary {
    fn from_loop<S: SweepSource, R: RenderSink>(
        update: &UpdateLoop<S, R>,
        source_ended: bool,
    ) -> Self {
        let snapshot = update.buffer().snapshot();
        Self {
            counters: update.metrics().snapshot(),
            bin_count: snapshot.len(),
            generation: snapshot.generation,
            peak: snapshot.peak(),
            source_ended,
        }
    }

    pub fn report_line(&self) -> String {
        let peak = self
            .peak
            .map(|(freq, db)| format!("{:.3} MHz @ {:.1} dB", freq, db))
            .unwrap_or_else(|| "n/a".into());
        format!(
            "ticks={} applied={} skipped={} idle={} malformed={} out_of_range={} bins={} generation={} peak={}\n",
            self.counters.ticks,
            self.counters.applied,
            self.counters.skipped,
            self.counters.idle,
            self.counters.malformed,
            self.counters.out_of_range,
            self.bin_count,
            self.generation,
            peak
        )
    }
}

#[derive(Clone)]
pub struct Runner {
    config: SweepConfig,
}

impl Runner {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// Ticks as fast as possible until the source is exhausted.
    pub fn run_offline<S: SweepSource, R: RenderSink>(
        &self,
        source: S,
        sink: R,
    ) -> anyhow::Result<RunSummary> {
        let buffer = self.config.to_buffer().context("building spectrum buffer")?;
        let mut update = UpdateLoop::new(source, buffer, sink);
        update.start().context("starting sweep source")?;

        while update.is_running() {
            update.tick();
        }
        update.shutdown();
        Ok(RunSummary::from_loop(&update, true))
    }

    /// Ticks on the configured interval until `shutdown` resolves or the source ends.
    pub async fn run_until<S, F>(
        &self,
        source: S,
        bridge: SpectrumBridge,
        shutdown: F,
    ) -> anyhow::Result<RunSummary>
    where
        S: SweepSource,
        F: Future<Output = ()>,
    {
        let buffer = self.config.to_buffer().context("building spectrum buffer")?;
        let interval = self.config.update_interval().context("reading update interval")?;
        let mut update = UpdateLoop::new(source, buffer, bridge.clone());
        update.start().context("starting sweep source")?;
        bridge.publish_status("sweeping");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut source_ended = false;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("[runner] shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    update.tick();
                    bridge.publish_counters(update.metrics().snapshot());
                    if !update.is_running() {
                        bridge.publish_status("sweep source ended; showing last spectrum");
                        source_ended = true;
                        break;
                    }
                }
            }
        }

        update.shutdown();
        Ok(RunSummary::from_loop(&update, source_ended))
    }
}

/// Keeps a serving bridge up after the source ran dry so clients still see the
/// last spectrum. Returns once `shutdown` resolves, or at once when nothing is served.
pub async fn hold_last_spectrum<F>(
    bridge: &SpectrumBridge,
    summary: &RunSummary,
    serving: bool,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    if !(serving && summary.source_ended) {
        return;
    }
    bridge.publish_status("sweep finished; serving last spectrum (Ctrl+C to stop)");
    shutdown.await;
    info!("[runner] bridge released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepcore::source::ScriptedSource;
    use sweepcore::spectrum::Snapshot;

    const LINES: [&str; 4] = [
        "# hackrf_sweep",
        "2024-01-01,00:00:00,6005000000,6105000000,1000000,0,-80.5,-81.2,-79.9",
        "2024-01-01,00:00:00,5000000000,5005000000,1000000,0,-50,-50",
        "broken",
    ];

    struct NullSink;

    impl RenderSink for NullSink {
        fn render(&mut self, _snapshot: &Snapshot) {}
    }

    #[test]
    fn offline_run_drains_source() {
        let runner = Runner::new(SweepConfig::default());
        let summary = runner
            .run_offline(ScriptedSource::new(LINES), NullSink)
            .unwrap();
        assert_eq!(summary.counters.applied, 1);
        assert_eq!(summary.counters.skipped, 1);
        assert_eq!(summary.counters.out_of_range, 1);
        assert_eq!(summary.counters.malformed, 1);
        assert_eq!(summary.counters.ticks, 5);
        assert_eq!(summary.peak, Some((6007.0, -79.9)));
        assert!(summary.report_line().contains("applied=1"));
    }

    #[test]
    fn offline_run_fails_fast_without_source() {
        let runner = Runner::new(SweepConfig::default());
        let result = runner.run_offline(
            ScriptedSource::unavailable("hackrf_sweep missing"),
            NullSink,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn live_run_stops_when_source_ends() {
        let config = SweepConfig {
            update_interval_ms: 1.0,
            ..Default::default()
        };
        let runner = Runner::new(config);
        let bridge = SpectrumBridge::new(-120.0, 0.0);
        let summary = runner
            .run_until(
                ScriptedSource::new(LINES),
                bridge.clone(),
                std::future::pending(),
            )
            .await
            .unwrap();

        assert_eq!(summary.counters.applied, 1);
        assert!(summary.source_ended);
        let model = bridge.model();
        assert_eq!(model.snapshot.unwrap().amplitudes_db[6], -81.2);
        assert_eq!(model.counters.ticks, 5);
    }

    #[tokio::test]
    async fn live_run_honours_shutdown_signal() {
        let runner = Runner::new(SweepConfig::default());
        let bridge = SpectrumBridge::new(-120.0, 0.0);
        let endless = ScriptedSource::with_gaps(std::iter::repeat(None).take(1_000));
        let summary = runner
            .run_until(endless, bridge, async {})
            .await
            .unwrap();
        assert_eq!(summary.counters.applied, 0);
        assert!(!summary.source_ended);
    }

    #[tokio::test]
    async fn ended_source_keeps_bridge_serving_until_shutdown() {
        let config = SweepConfig {
            update_interval_ms: 1.0,
            ..Default::default()
        };
        let runner = Runner::new(config);
        let bridge = SpectrumBridge::new(-120.0, 0.0);
        let summary = runner
            .run_until(ScriptedSource::new(LINES), bridge.clone(), std::future::pending())
            .await
            .unwrap();

        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let holder = {
            let bridge = bridge.clone();
            let summary = summary.clone();
            tokio::spawn(async move {
                hold_last_spectrum(&bridge, &summary, true, async {
                    let _ = released.await;
                })
                .await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!holder.is_finished());
        let model = bridge.model();
        assert!(model.status.contains("serving last spectrum"));
        assert_eq!(model.snapshot.unwrap().amplitudes_db[6], -81.2);

        release.send(()).unwrap();
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn hold_returns_at_once_when_not_serving_or_interrupted() {
        let bridge = SpectrumBridge::new(-120.0, 0.0);
        let runner = Runner::new(SweepConfig::default());
        let ended = runner
            .run_offline(ScriptedSource::new(LINES), bridge.clone())
            .unwrap();
        hold_last_spectrum(&bridge, &ended, false, std::future::pending()).await;

        let interrupted = RunSummary {
            source_ended: false,
            ..ended
        };
        hold_last_spectrum(&bridge, &interrupted, true, std::future::pending()).await;
        assert!(bridge.model().status.is_empty());
    }
}
