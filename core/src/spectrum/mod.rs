pub mod axis;
pub mod buffer;
pub mod snapshot;

pub use axis::FrequencyAxis;
pub use buffer::{AppliedRange, SpectrumBuffer};
pub use snapshot::Snapshot;
