use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use sweepcore::prelude::{SweepError, SweepResult};
use sweepcore::spectrum::{FrequencyAxis, SpectrumBuffer};

fn default_sweep_binary() -> String {
    "hackrf_sweep".into()
}

fn default_bridge_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn default_channel_capacity() -> usize {
    1024
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SweepConfig {
    pub freq_min_mhz: f64,
    pub freq_max_mhz: f64,
    pub bin_width_hz: f64,
    pub plot_db_min: f32,
    pub plot_db_max: f32,
    pub update_interval_ms: f64,
    #[serde(default = "default_sweep_binary")]
    pub sweep_binary: String,
    #[serde(default = "default_bridge_addr")]
    pub bridge_addr: SocketAddr,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            freq_min_mhz: 6000.0,
            freq_max_mhz: 6100.0,
            bin_width_hz: 1_000_000.0,
            plot_db_min: -120.0,
            plot_db_max: 0.0,
            update_interval_ms: 0.1,
            sweep_binary: default_sweep_binary(),
            bridge_addr: default_bridge_addr(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SweepConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading sweep config {}", path_ref.display()))?;
        let config: SweepConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing sweep config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating sweep config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> SweepResult<()> {
        self.to_axis()?;
        if !(self.plot_db_max > self.plot_db_min) {
            return Err(SweepError::InvalidConfig(format!(
                "plot_db_max {} must exceed plot_db_min {}",
                self.plot_db_max, self.plot_db_min
            )));
        }
        self.update_interval()?;
        if self.channel_capacity == 0 {
            return Err(SweepError::InvalidConfig(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn to_axis(&self) -> SweepResult<FrequencyAxis> {
        FrequencyAxis::from_hz_bin_width(self.freq_min_mhz, self.freq_max_mhz, self.bin_width_hz)
    }

    /// Fresh buffer with every bin at `plot_db_min`.
    pub fn to_buffer(&self) -> SweepResult<SpectrumBuffer> {
        Ok(SpectrumBuffer::new(self.to_axis()?, self.plot_db_min))
    }

    pub fn update_interval(&self) -> SweepResult<Duration> {
        let invalid = || {
            SweepError::InvalidConfig(format!(
                "update_interval_ms {} must be a positive, representable duration",
                self.update_interval_ms
            ))
        };
        if !(self.update_interval_ms > 0.0) {
            return Err(invalid());
        }
        Duration::try_from_secs_f64(self.update_interval_ms / 1000.0).map_err(|_| invalid())
    }

    /// Arguments for `hackrf_sweep`: `-f <min>:<max>` in MHz and `-w <bin width>` in Hz.
    pub fn sweep_args(&self) -> Vec<String> {
        vec![
            "-f".into(),
            format!("{}:{}", self.freq_min_mhz, self.freq_max_mhz),
            "-w".into(),
            format!("{}", self.bin_width_hz),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_builds_hundred_bin_buffer() {
        let cfg = SweepConfig::default();
        cfg.validate().unwrap();
        let buffer = cfg.to_buffer().unwrap();
        assert_eq!(buffer.amplitudes().len(), 100);
        assert_eq!(buffer.floor_db(), -120.0);
    }

    #[test]
    fn sweep_args_match_hackrf_syntax() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.sweep_args(), vec!["-f", "6000:6100", "-w", "1000000"]);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"freq_min_mhz: 2400\nfreq_max_mhz: 2500\nbin_width_hz: 500000\nplot_db_min: -100\nplot_db_max: -10\nupdate_interval_ms: 50\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SweepConfig::load(&path).unwrap();
        assert_eq!(cfg.to_axis().unwrap().bin_count(), 200);
        assert_eq!(cfg.sweep_binary, "hackrf_sweep");
        assert_eq!(cfg.update_interval().unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/sweep.yaml");
        assert_eq!(SweepConfig::load(path).unwrap(), SweepConfig::default());
    }

    #[test]
    fn config_load_rejects_inverted_plot_range() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"freq_min_mhz: 2400\nfreq_max_mhz: 2500\nbin_width_hz: 1000000\nplot_db_min: 0\nplot_db_max: -120\nupdate_interval_ms: 10\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        assert!(SweepConfig::load(&path).is_err());
    }

    #[test]
    fn validate_rejects_zero_interval_and_bad_axis() {
        let cfg = SweepConfig {
            update_interval_ms: 0.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));

        let cfg = SweepConfig {
            bin_width_hz: -1.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidAxis(_))));
    }

    #[test]
    fn validate_rejects_configs_too_large_to_run() {
        let cfg = SweepConfig {
            freq_max_mhz: 1e15,
            bin_width_hz: 1e-6,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidAxis(_))));
        assert!(cfg.to_buffer().is_err());

        let cfg = SweepConfig {
            update_interval_ms: 1e30,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SweepError::InvalidConfig(_))));
        assert!(cfg.update_interval().is_err());

        let cfg = SweepConfig {
            update_interval_ms: f64::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
