use crate::spectrum::Snapshot;

/// Common error type for parsing, buffer updates and line sources.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error("malformed segment: {0}")]
    MalformedSegment(String),
    #[error("segment bins {start_idx}..{end_idx} fall outside 0..{bin_count}")]
    OutOfRange {
        start_idx: i64,
        end_idx: i64,
        bin_count: usize,
    },
    #[error("sweep source ended")]
    SourceEnded,
    #[error("sweep source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("invalid frequency axis: {0}")]
    InvalidAxis(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SweepResult<T> = Result<T, SweepError>;

/// Producer of raw sweep lines.
///
/// `next_line` must never block: `Ok(None)` means nothing is buffered yet,
/// `Err(SweepError::SourceEnded)` means the feed is gone for good.
pub trait SweepSource {
    fn start(&mut self) -> SweepResult<()>;
    fn next_line(&mut self) -> SweepResult<Option<String>>;
    fn stop(&mut self);
}

/// Consumer of spectrum snapshots, typically a display.
pub trait RenderSink {
    fn render(&mut self, snapshot: &Snapshot);
}

impl<S: SweepSource + ?Sized> SweepSource for Box<S> {
    fn start(&mut self) -> SweepResult<()> {
        (**self).start()
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        (**self).next_line()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<R: RenderSink + ?Sized> RenderSink for Box<R> {
    fn render(&mut self, snapshot: &Snapshot) {
        (**self).render(snapshot)
    }
}
