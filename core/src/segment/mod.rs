pub mod parser;

pub use parser::{ParsedLine, SegmentParser};

/// One decoded sweep record covering a contiguous run of bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start_freq_mhz: f64,
    /// As reported by the sweep tool; not checked against the axis.
    pub bin_width_mhz: f64,
    /// One amplitude per bin, ascending frequency.
    pub amplitudes_db: Vec<f32>,
}
