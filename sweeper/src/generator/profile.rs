use crate::workflow::config::SweepConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use sweepcore::prelude::{SweepError, SweepResult, SweepSource};

/// Narrowband emitter painted on top of the synthetic noise floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub freq_mhz: f64,
    pub power_db: f32,
    pub width_mhz: f64,
}

/// Configuration for generating synthetic `hackrf_sweep` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub freq_min_mhz: f64,
    pub freq_max_mhz: f64,
    pub bin_width_hz: f64,
    /// Bins reported per line; hackrf_sweep emits 5.
    pub bins_per_segment: usize,
    pub noise_floor_db: f32,
    pub noise_db: f32,
    pub seed: u64,
    pub carriers: Vec<Carrier>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            freq_min_mhz: 6000.0,
            freq_max_mhz: 6100.0,
            bin_width_hz: 1_000_000.0,
            bins_per_segment: 5,
            noise_floor_db: -95.0,
            noise_db: 3.0,
            seed: 0,
            carriers: vec![Carrier {
                freq_mhz: 6040.0,
                power_db: -35.0,
                width_mhz: 2.0,
            }],
        }
    }
}

impl GeneratorConfig {
    pub fn from_sweep_config(config: &SweepConfig, seed: u64) -> Self {
        let span = config.freq_max_mhz - config.freq_min_mhz;
        Self {
            freq_min_mhz: config.freq_min_mhz,
            freq_max_mhz: config.freq_max_mhz,
            bin_width_hz: config.bin_width_hz,
            seed,
            carriers: vec![Carrier {
                freq_mhz: config.freq_min_mhz + span * 0.4,
                power_db: -35.0,
                width_mhz: (span * 0.02).max(config.bin_width_hz / 1e6),
            }],
            ..Default::default()
        }
    }

    fn normalized_segment(&self) -> usize {
        self.bins_per_segment.max(1)
    }

    fn bin_width_mhz(&self) -> f64 {
        self.bin_width_hz / 1e6
    }
}

fn carrier_power(carriers: &[Carrier], freq_mhz: f64) -> Option<f32> {
    carriers
        .iter()
        .filter(|c| (freq_mhz - c.freq_mhz).abs() <= c.width_mhz / 2.0)
        .map(|c| c.power_db)
        .fold(None, |best: Option<f32>, p| Some(best.map_or(p, |b| b.max(p))))
}

/// Emits one full pass over the configured span as hackrf-style CSV lines.
pub fn build_sweep_lines(config: &GeneratorConfig, rng: &mut StdRng, pass: u64) -> Vec<String> {
    let bin_width_mhz = config.bin_width_mhz();
    if bin_width_mhz <= 0.0 || config.freq_max_mhz <= config.freq_min_mhz {
        return Vec::new();
    }

    let per_segment = config.normalized_segment();
    let total_bins = ((config.freq_max_mhz - config.freq_min_mhz) / bin_width_mhz).round() as usize;
    let time = format!(
        "{:02}:{:02}:{:02}",
        (pass / 3600) % 24,
        (pass / 60) % 60,
        pass % 60
    );

    let mut lines = Vec::with_capacity(total_bins / per_segment + 1);
    let mut bin = 0;
    while bin < total_bins {
        let count = per_segment.min(total_bins - bin);
        let low_mhz = config.freq_min_mhz + bin as f64 * bin_width_mhz;
        let high_mhz = low_mhz + count as f64 * bin_width_mhz;

        let mut fields = vec![
            "1970-01-01".to_string(),
            time.clone(),
            format!("{:.0}", low_mhz * 1e6),
            format!("{:.0}", high_mhz * 1e6),
            format!("{:.2}", config.bin_width_hz),
            format!("{}", count * 4),
        ];
        for offset in 0..count {
            let freq = low_mhz + offset as f64 * bin_width_mhz;
            let jitter = if config.noise_db > 0.0 {
                rng.gen_range(-config.noise_db..config.noise_db)
            } else {
                0.0
            };
            let level = carrier_power(&config.carriers, freq).unwrap_or(config.noise_floor_db);
            fields.push(format!("{:.2}", level + jitter));
        }
        lines.push(fields.join(", "));
        bin += count;
    }
    lines
}

/// Endless demo source: repeats synthetic sweeps with fresh noise each pass.
pub struct SyntheticSource {
    config: GeneratorConfig,
    rng: StdRng,
    pending: VecDeque<String>,
    pass: u64,
    stopped: bool,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            pending: VecDeque::new(),
            pass: 0,
            stopped: false,
        }
    }
}

impl SweepSource for SyntheticSource {
    fn start(&mut self) -> SweepResult<()> {
        self.stopped = false;
        self.pending
            .push_back(format!("# synthetic sweep seed {}", self.config.seed));
        Ok(())
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        if self.stopped {
            return Err(SweepError::SourceEnded);
        }
        if self.pending.is_empty() {
            let lines = build_sweep_lines(&self.config, &mut self.rng, self.pass);
            self.pass += 1;
            self.pending.extend(lines);
        }
        Ok(self.pending.pop_front())
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.pending.clear();
    }
}
