use crate::prelude::{RenderSink, SweepError, SweepResult, SweepSource};
use crate::segment::{ParsedLine, SegmentParser};
use crate::spectrum::{AppliedRange, SpectrumBuffer};
use crate::telemetry::{LogManager, MetricsRecorder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Ticking,
    /// Source ended or was shut down; ticks only re-render the last state.
    Finished,
}

/// What a single tick did with the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Applied(AppliedRange),
    /// Comment or blank line.
    Skipped,
    /// No line was ready this tick.
    Idle,
    /// Malformed line or out-of-range segment; logged and dropped.
    Rejected(SweepError),
    Ended,
}

/// Drives source → parser → buffer → sink, one line per tick.
///
/// Owns the spectrum buffer exclusively; the sink only ever sees snapshots.
pub struct UpdateLoop<S: SweepSource, R: RenderSink> {
    source: S,
    sink: R,
    buffer: SpectrumBuffer,
    state: LoopState,
    started: bool,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<S: SweepSource, R: RenderSink> UpdateLoop<S, R> {
    pub fn new(source: S, buffer: SpectrumBuffer, sink: R) -> Self {
        Self {
            source,
            sink,
            buffer,
            state: LoopState::Idle,
            started: false,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("update-loop"),
        }
    }

    /// Acquires the source. Must succeed before the first tick.
    pub fn start(&mut self) -> SweepResult<()> {
        self.source.start()?;
        self.started = true;
        self.state = LoopState::Idle;
        self.logger.record(&format!(
            "started: {} bins from {} MHz",
            self.buffer.axis().bin_count(),
            self.buffer.axis().min_freq_mhz()
        ));
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.metrics.record_tick();

        if self.state == LoopState::Finished || !self.started {
            self.render();
            return TickOutcome::Ended;
        }

        self.state = LoopState::Ticking;
        let outcome = self.ingest();
        if self.state == LoopState::Ticking {
            self.state = LoopState::Idle;
        }
        self.render();
        outcome
    }

    fn ingest(&mut self) -> TickOutcome {
        let line = match self.source.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.metrics.record_idle();
                return TickOutcome::Idle;
            }
            Err(err) => {
                self.logger.warn(&format!("{}; keeping last spectrum", err));
                self.state = LoopState::Finished;
                return TickOutcome::Ended;
            }
        };

        let segment = match SegmentParser::parse(&line) {
            Ok(ParsedLine::Segment(segment)) => segment,
            Ok(ParsedLine::Skip) => {
                self.metrics.record_skipped();
                return TickOutcome::Skipped;
            }
            Err(err) => {
                self.metrics.record_malformed();
                self.logger.warn(&format!("dropping line: {}", err));
                return TickOutcome::Rejected(err);
            }
        };

        match self.buffer.apply(&segment) {
            Ok(range) => {
                self.metrics.record_applied();
                self.logger.trace_tick(&format!(
                    "applied bins {}..{} ({} truncated)",
                    range.start_idx, range.end_idx, range.truncated
                ));
                TickOutcome::Applied(range)
            }
            Err(err) => {
                self.metrics.record_out_of_range();
                self.logger.warn(&format!(
                    "segment at {:.3} MHz ignored: {}",
                    segment.start_freq_mhz, err
                ));
                TickOutcome::Rejected(err)
            }
        }
    }

    fn render(&mut self) {
        let snapshot = self.buffer.snapshot();
        self.sink.render(&snapshot);
    }

    /// Stops the source. Safe to call more than once; the buffer is kept.
    pub fn shutdown(&mut self) {
        if self.started {
            self.source.stop();
            self.started = false;
            self.logger.record("source stopped");
        }
        self.state = LoopState::Finished;
    }

    pub fn is_running(&self) -> bool {
        self.started && self.state != LoopState::Finished
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn buffer(&self) -> &SpectrumBuffer {
        &self.buffer
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
