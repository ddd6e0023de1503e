pub mod hackrf;
pub mod replay;

pub use hackrf::ProcessSource;
pub use replay::ReplaySource;
