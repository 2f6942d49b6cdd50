//! Non-blocking activity sink backed by a bounded tokio channel.
//!
//! The receiving half is drained by an outer task; a full or closed channel
//! fails the single delivery and never blocks the caller.
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::mpsc::error::TrySendError;

use crate::ActivitySink;
use crate::event::ActivityRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelSinkError {
    #[error("activity channel is full")]
    Full,
    #[error("activity channel is closed")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ActivityRecord>,
}

impl ChannelSink {
    /// Create a sink and the receiver an outer task should drain.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<ActivityRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ActivitySink for ChannelSink {
    type Error = ChannelSinkError;

    fn log_activity(&self, record: &ActivityRecord) -> Result<(), Self::Error> {
        self.tx.try_send(record.clone()).map_err(|err| match err {
            TrySendError::Full(_) => ChannelSinkError::Full,
            TrySendError::Closed(_) => ChannelSinkError::Closed,
        })
    }
}
