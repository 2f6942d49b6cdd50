//! Activity and score sinks used while autoplaying.
//!
//! Activity records go through the engine's non-blocking channel sink; a
//! background task drains the channel into a JSON-lines file (or nowhere).
use anyhow::{Context, Result};
use roguequiz_game::{ActivityRecord, ChannelSink, ScorePublisher};
use serde::Serialize;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

/// Records buffered between the engine and the writer task.
pub const ACTIVITY_CHANNEL_CAPACITY: usize = 4_096;

/// Collects published scores so each run can be checked for a single publish.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    scores: Arc<Mutex<Vec<i64>>>,
}

impl ScoreBoard {
    /// Take every score published since the last call.
    #[must_use]
    pub fn take(&self) -> Vec<i64> {
        let mut scores = self.scores.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *scores)
    }
}

impl ScorePublisher for ScoreBoard {
    type Error = Infallible;

    fn publish_score(&self, final_score: i64) -> Result<(), Self::Error> {
        self.scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(final_score);
        Ok(())
    }
}

/// Totals reported by the drain task once every sender is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityLogStats {
    pub received: usize,
    pub written: usize,
}

/// The engine-facing sink plus the task draining it.
pub struct ActivityLog {
    pub sink: ChannelSink,
    pub handle: JoinHandle<Result<ActivityLogStats>>,
}

impl ActivityLog {
    /// Spawn the drain task. With no path the records are counted and dropped.
    pub fn spawn(path: Option<PathBuf>) -> Self {
        let (sink, rx) = ChannelSink::bounded(ACTIVITY_CHANNEL_CAPACITY);
        let handle = tokio::spawn(drain(rx, path));
        Self { sink, handle }
    }
}

async fn drain(
    mut rx: Receiver<ActivityRecord>,
    path: Option<PathBuf>,
) -> Result<ActivityLogStats> {
    let mut writer = match &path {
        Some(path) => Some(BufWriter::new(File::create(path).await.with_context(
            || format!("failed to create activity log {}", path.display()),
        )?)),
        None => None,
    };

    let mut stats = ActivityLogStats::default();
    while let Some(record) = rx.recv().await {
        stats.received += 1;
        if let Some(writer) = writer.as_mut() {
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            stats.written += 1;
        }
    }

    if let Some(mut writer) = writer {
        writer.flush().await?;
    }
    Ok(stats)
}
