use anyhow::Context;
use bridge::bridge::SpectrumBridge;
use clap::Parser;
use generator::profile::{GeneratorConfig, SyntheticSource};
use log::{info, warn};
use process::{ProcessSource, ReplaySource};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SweepConfig;
use workflow::runner::{hold_last_spectrum, RunSummary, Runner};

mod bridge;
mod generator;
mod process;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Live hackrf_sweep spectrum driver")]
struct Args {
    /// Load the sweep config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    freq_min_mhz: Option<f64>,
    #[arg(long)]
    freq_max_mhz: Option<f64>,
    #[arg(long)]
    bin_width_hz: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    plot_db_min: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    plot_db_max: Option<f32>,
    #[arg(long)]
    update_interval_ms: Option<f64>,
    /// Sweep tool to launch instead of `hackrf_sweep`
    #[arg(long)]
    sweep_binary: Option<String>,
    /// Replay a recorded sweep capture offline and print a summary
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Feed generated sweeps instead of real hardware
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Serve the spectrum over HTTP for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn sweep_config(&self) -> anyhow::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::load(path)?,
            None => SweepConfig::default(),
        };
        if let Some(value) = self.freq_min_mhz {
            config.freq_min_mhz = value;
        }
        if let Some(value) = self.freq_max_mhz {
            config.freq_max_mhz = value;
        }
        if let Some(value) = self.bin_width_hz {
            config.bin_width_hz = value;
        }
        if let Some(value) = self.plot_db_min {
            config.plot_db_min = value;
        }
        if let Some(value) = self.plot_db_max {
            config.plot_db_max = value;
        }
        if let Some(value) = self.update_interval_ms {
            config.update_interval_ms = value;
        }
        if let Some(binary) = &self.sweep_binary {
            config.sweep_binary = binary.clone();
        }
        config.validate().context("validating sweep config")?;
        Ok(config)
    }
}

fn append_report(summary: &RunSummary) -> anyhow::Result<()> {
    let report_path = PathBuf::from("tools/data/sweep_summary.log");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening {}", report_path.display()))?;
    file.write_all(summary.report_line().as_bytes())?;
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("Ctrl+C handler unavailable: {}", err);
        std::future::pending::<()>().await;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.sweep_config()?;

    let runner = Runner::new(config.clone());
    let bridge = SpectrumBridge::new(config.plot_db_min, config.plot_db_max);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating async runtime")?;

    runtime.block_on(async {
        if args.serve {
            bridge.serve(config.bridge_addr)?;
        }

        let summary = if let Some(path) = &args.replay {
            let summary = runner.run_offline(ReplaySource::new(path), bridge.clone())?;
            println!("Replay {} -> {}", path.display(), summary.report_line().trim_end());
            append_report(&summary)?;
            summary
        } else if args.synthetic {
            let generator = GeneratorConfig::from_sweep_config(&config, args.seed);
            runner
                .run_until(SyntheticSource::new(generator), bridge.clone(), wait_for_ctrl_c())
                .await?
        } else {
            let source = ProcessSource::from_config(&config);
            info!("launching `{}`", source.command_line());
            runner
                .run_until(source, bridge.clone(), wait_for_ctrl_c())
                .await
                .context("running live sweep")?
        };

        info!("sweep finished: {}", summary.report_line().trim_end());
        hold_last_spectrum(&bridge, &summary, args.serve, wait_for_ctrl_c()).await;
        Ok::<(), anyhow::Error>(())
    })
}
