use crate::prelude::{SweepError, SweepResult, SweepSource};
use std::collections::VecDeque;

/// In-memory source that replays a fixed script of polls.
///
/// Each entry is one poll result: `Some(line)` delivers a line, `None`
/// simulates a tick where the producer had nothing ready.
pub struct ScriptedSource {
    script: VecDeque<Option<String>>,
    stopped: bool,
    fail_start: Option<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_gaps(lines.into_iter().map(|line| Some(line.into())))
    }

    pub fn with_gaps<I>(polls: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            script: polls.into_iter().collect(),
            stopped: false,
            fail_start: None,
        }
    }

    /// Source whose `start` fails, as when the sweep tool cannot be launched.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            fail_start: Some(reason.into()),
            ..Self::with_gaps(std::iter::empty())
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SweepSource for ScriptedSource {
    fn start(&mut self) -> SweepResult<()> {
        if let Some(reason) = &self.fail_start {
            return Err(SweepError::SourceUnavailable(reason.clone()));
        }
        Ok(())
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        if self.stopped {
            return Err(SweepError::SourceEnded);
        }
        match self.script.pop_front() {
            Some(poll) => Ok(poll),
            None => Err(SweepError::SourceEnded),
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.script.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_then_ends() {
        let mut source = ScriptedSource::with_gaps(vec![Some("a".into()), None]);
        source.start().unwrap();
        assert_eq!(source.next_line().unwrap(), Some("a".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
    }

    #[test]
    fn stopped_source_reports_end() {
        let mut source = ScriptedSource::new(["a", "b"]);
        source.stop();
        assert!(source.is_stopped());
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
    }

    #[test]
    fn unavailable_source_fails_to_start() {
        let mut source = ScriptedSource::unavailable("no device");
        assert!(matches!(
            source.start(),
            Err(SweepError::SourceUnavailable(reason)) if reason == "no device"
        ));
    }
}
