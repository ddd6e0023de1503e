pub mod update_loop;

pub use update_loop::{LoopState, TickOutcome, UpdateLoop};
