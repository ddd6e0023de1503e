use crate::workflow::config::SweepConfig;
use log::{debug, info, warn};
use std::process::{ExitStatus, Stdio};
use sweepcore::prelude::{SweepError, SweepResult, SweepSource};
use sweepcore::source::{ChannelSource, LineSender};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Sweep source backed by a long-lived `hackrf_sweep` child process.
///
/// Stdout lines are forwarded by a reader task into a bounded channel that
/// the update loop polls without blocking. The child is killed on `stop`
/// and, failing that, when the source is dropped.
pub struct ProcessSource {
    binary: String,
    args: Vec<String>,
    capacity: usize,
    child: Option<Child>,
    lines: Option<ChannelSource>,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessSource {
    pub fn new(binary: impl Into<String>, args: Vec<String>, capacity: usize) -> Self {
        Self {
            binary: binary.into(),
            args,
            capacity,
            child: None,
            lines: None,
            readers: Vec::new(),
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(
            config.sweep_binary.clone(),
            config.sweep_args(),
            config.channel_capacity,
        )
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.binary.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Releases the child: reports how it exited, or kills it if still running.
    fn reap(&mut self) -> Option<ExitStatus> {
        let mut child = self.child.take()?;
        match child.try_wait() {
            Ok(Some(status)) if status.success() => {
                info!("[sweep-process] `{}` exited: {}", self.binary, status);
                Some(status)
            }
            Ok(Some(status)) => {
                warn!(
                    "[sweep-process] `{}` failed ({}); sweep stopped",
                    self.command_line(),
                    status
                );
                Some(status)
            }
            _ => {
                if let Err(err) = child.start_kill() {
                    warn!("[sweep-process] failed to kill child: {}", err);
                } else {
                    info!("[sweep-process] terminated `{}`", self.binary);
                }
                None
            }
        }
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, sender: LineSender) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if sender.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("[sweep-process] stdout read failed: {}", err);
                break;
            }
        }
    }
}

async fn log_stderr<R: AsyncRead + Unpin>(reader: R) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("[sweep-process] {}", line);
    }
}

impl SweepSource for ProcessSource {
    fn start(&mut self) -> SweepResult<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let handle = Handle::try_current()
            .map_err(|_| SweepError::SourceUnavailable("no async runtime available".into()))?;

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| SweepError::SourceUnavailable(format!("{}: {}", self.binary, err)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SweepError::SourceUnavailable(format!("{}: stdout not captured", self.binary))
        })?;
        let (sender, mut lines) = ChannelSource::bounded(self.capacity);
        lines.start()?;

        self.readers.push(handle.spawn(forward_lines(stdout, sender)));
        if let Some(stderr) = child.stderr.take() {
            self.readers.push(handle.spawn(log_stderr(stderr)));
        }

        info!("[sweep-process] spawned `{}`", self.command_line());
        self.child = Some(child);
        self.lines = Some(lines);
        Ok(())
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines.next_line(),
            None => Err(SweepError::SourceEnded),
        }
    }

    fn stop(&mut self) {
        if let Some(mut lines) = self.lines.take() {
            lines.stop();
        }
        self.reap();
        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }
}

impl Drop for ProcessSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn poll_line(source: &mut ProcessSource) -> SweepResult<Option<String>> {
        for _ in 0..200 {
            match source.next_line() {
                Ok(None) => tokio::time::sleep(Duration::from_millis(5)).await,
                other => return other,
            }
        }
        Ok(None)
    }

    #[test]
    fn command_line_uses_config_arguments() {
        let source = ProcessSource::from_config(&SweepConfig::default());
        assert_eq!(source.command_line(), "hackrf_sweep -f 6000:6100 -w 1000000");
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let mut source = ProcessSource::new("definitely-not-a-sweep-tool", Vec::new(), 8);
        assert!(matches!(
            source.start(),
            Err(SweepError::SourceUnavailable(_))
        ));
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
    }

    #[tokio::test]
    async fn child_stdout_is_streamed_then_ends() {
        let mut source = ProcessSource::new(
            "sh",
            vec!["-c".into(), "echo '# sweep'; echo 'd,t,1,2,3,4,5'".into()],
            8,
        );
        source.start().unwrap();
        assert_eq!(poll_line(&mut source).await.unwrap(), Some("# sweep".into()));
        assert_eq!(
            poll_line(&mut source).await.unwrap(),
            Some("d,t,1,2,3,4,5".into())
        );
        assert_eq!(poll_line(&mut source).await, Err(SweepError::SourceEnded));
        source.stop();
        assert!(source.child.is_none());
    }

    #[tokio::test]
    async fn failing_tool_reports_its_exit_status() {
        let mut source = ProcessSource::new(
            "sh",
            vec!["-c".into(), "echo 'No HackRF boards found.' >&2; exit 3".into()],
            8,
        );
        source.start().unwrap();
        assert_eq!(poll_line(&mut source).await, Err(SweepError::SourceEnded));

        let status = source.child.as_mut().unwrap().wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
        let reaped = source.reap().unwrap();
        assert!(!reaped.success());
        assert!(source.child.is_none());
        source.stop();
    }

    #[tokio::test]
    async fn stop_terminates_long_running_child() {
        let mut source = ProcessSource::new("sleep", vec!["30".into()], 8);
        source.start().unwrap();
        assert_eq!(source.next_line().unwrap(), None);
        source.stop();
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
    }
}
