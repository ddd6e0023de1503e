pub mod channel;
pub mod scripted;

pub use channel::{ChannelSource, LineSender};
pub use scripted::ScriptedSource;
