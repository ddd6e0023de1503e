use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use sweepcore::prelude::{SweepError, SweepResult, SweepSource};

/// Replays a recorded `hackrf_sweep` capture, one line per poll.
pub struct ReplaySource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    lines_read: usize,
}

impl ReplaySource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reader: None,
            lines_read: 0,
        }
    }
}

impl SweepSource for ReplaySource {
    fn start(&mut self) -> SweepResult<()> {
        let file = File::open(&self.path).map_err(|err| {
            SweepError::SourceUnavailable(format!("{}: {}", self.path.display(), err))
        })?;
        self.reader = Some(BufReader::new(file));
        self.lines_read = 0;
        info!("[replay] reading {}", self.path.display());
        Ok(())
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        let reader = self.reader.as_mut().ok_or(SweepError::SourceEnded)?;
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("[replay] end of capture after {} lines", self.lines_read);
                self.reader = None;
                Err(SweepError::SourceEnded)
            }
            Ok(_) => {
                self.lines_read += 1;
                Ok(Some(line))
            }
            Err(err) => {
                warn!("[replay] read failed after {} lines: {}", self.lines_read, err);
                self.reader = None;
                Err(SweepError::SourceEnded)
            }
        }
    }

    fn stop(&mut self) {
        self.reader = None;
    }
}
