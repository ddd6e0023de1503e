//! Segment reassembly core for the live RF sweep spectrum analyzer.
//!
//! Raw sweep lines are decoded into segments, written into a fixed-size
//! amplitude buffer indexed by frequency bin, and handed to a render sink as
//! snapshots, one line per scheduler tick.

pub mod prelude;
pub mod segment;
pub mod source;
pub mod spectrum;
pub mod telemetry;
pub mod update;

pub use prelude::{RenderSink, SweepError, SweepResult, SweepSource};
pub use segment::{ParsedLine, Segment, SegmentParser};
pub use spectrum::{AppliedRange, FrequencyAxis, Snapshot, SpectrumBuffer};
pub use update::{LoopState, TickOutcome, UpdateLoop};
