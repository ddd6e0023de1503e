use crate::prelude::{SweepError, SweepResult, SweepSource};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Producer half handed to whatever task reads the raw sweep output.
pub type LineSender = mpsc::Sender<String>;

/// Non-blocking consumer side of a bounded line channel.
///
/// The bound is what gives a slow render loop backpressure over the
/// producer: once `capacity` lines are queued the producer's `send` waits.
pub struct ChannelSource {
    receiver: mpsc::Receiver<String>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<String>) -> Self {
        Self {
            receiver,
            closed: false,
        }
    }

    pub fn bounded(capacity: usize) -> (LineSender, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self::new(receiver))
    }
}

impl SweepSource for ChannelSource {
    fn start(&mut self) -> SweepResult<()> {
        if self.closed {
            return Err(SweepError::SourceUnavailable("channel already closed".into()));
        }
        Ok(())
    }

    fn next_line(&mut self) -> SweepResult<Option<String>> {
        match self.receiver.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(TryRecvError::Empty) if !self.closed => Ok(None),
            Err(_) => Err(SweepError::SourceEnded),
        }
    }

    fn stop(&mut self) {
        self.closed = true;
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_source_polls_without_blocking() {
        let (sender, mut source) = ChannelSource::bounded(4);
        source.start().unwrap();
        assert_eq!(source.next_line().unwrap(), None);

        sender.send("line".to_string()).await.unwrap();
        assert_eq!(source.next_line().unwrap(), Some("line".to_string()));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[tokio::test]
    async fn dropped_sender_ends_source_after_drain() {
        let (sender, mut source) = ChannelSource::bounded(4);
        sender.send("last".to_string()).await.unwrap();
        drop(sender);
        assert_eq!(source.next_line().unwrap(), Some("last".to_string()));
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
    }

    #[tokio::test]
    async fn full_channel_pushes_back_on_producer() {
        let (sender, mut source) = ChannelSource::bounded(1);
        sender.try_send("a".to_string()).unwrap();
        assert!(sender.try_send("b".to_string()).is_err());
        source.next_line().unwrap();
        assert!(sender.try_send("b".to_string()).is_ok());
    }

    #[tokio::test]
    async fn stop_rejects_new_lines() {
        let (sender, mut source) = ChannelSource::bounded(4);
        source.stop();
        assert!(sender.send("late".to_string()).await.is_err());
        assert_eq!(source.next_line(), Err(SweepError::SourceEnded));
        assert!(source.start().is_err());
    }
}
