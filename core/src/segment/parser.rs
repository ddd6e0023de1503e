use crate::prelude::{SweepError, SweepResult};
use crate::segment::Segment;

const MIN_FIELDS: usize = 7;
const START_FREQ_FIELD: usize = 2;
const BIN_WIDTH_FIELD: usize = 4;
const FIRST_AMPLITUDE_FIELD: usize = 6;
const HZ_PER_MHZ: f64 = 1e6;

/// Result of decoding one line of sweep output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Segment(Segment),
    /// Blank line or `#` comment.
    Skip,
}

/// Decoder for hackrf_sweep CSV records:
/// `date, time, hz_low, hz_high, hz_bin_width, num_samples, dB, dB, ...`.
pub struct SegmentParser;

impl SegmentParser {
    pub fn parse(line: &str) -> SweepResult<ParsedLine> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(ParsedLine::Skip);
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return Err(SweepError::MalformedSegment(format!(
                "expected at least {} fields, found {}",
                MIN_FIELDS,
                fields.len()
            )));
        }

        let start_hz = parse_frequency(fields[START_FREQ_FIELD], "start frequency")?;
        let bin_width_hz = parse_frequency(fields[BIN_WIDTH_FIELD], "bin width")?;

        let mut samples = &fields[FIRST_AMPLITUDE_FIELD..];
        while let Some((last, rest)) = samples.split_last() {
            if !last.is_empty() {
                break;
            }
            samples = rest;
        }

        let amplitudes_db = samples
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                raw.parse::<f32>().map_err(|_| {
                    SweepError::MalformedSegment(format!(
                        "amplitude {} is not a number: {:?}",
                        idx, raw
                    ))
                })
            })
            .collect::<SweepResult<Vec<f32>>>()?;

        if amplitudes_db.is_empty() {
            return Err(SweepError::MalformedSegment("no amplitude samples".into()));
        }

        Ok(ParsedLine::Segment(Segment {
            start_freq_mhz: start_hz / HZ_PER_MHZ,
            bin_width_mhz: bin_width_hz / HZ_PER_MHZ,
            amplitudes_db,
        }))
    }
}

fn parse_frequency(raw: &str, name: &str) -> SweepResult<f64> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| SweepError::MalformedSegment(format!("{} is not a number: {:?}", name, raw)))?;
    if !value.is_finite() {
        return Err(SweepError::MalformedSegment(format!(
            "{} is not finite: {}",
            name, raw
        )));
    }
    Ok(value)
}
