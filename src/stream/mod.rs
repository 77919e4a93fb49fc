//! Progress stream for long-running pipelines.
//!
//! A run is exposed to the caller as newline-delimited JSON records:
//!
//! ```text
//! {"type":"created","entity_id":"..."}        (creation only)
//! {"type":"status","message":"Reviewing the proposed policy"}
//! {"type":"heartbeat"}
//! {"type":"status","message":"Updating 13 dimensions"}
//! ...
//! {"type":"complete","snapshot":{...}}        or {"type":"error","message":"..."}
//! ```
//!
//! Two producers feed the stream: the pipeline's status channel and a
//! heartbeat timer. They are merged with `tokio::select!`, statuses first, and
//! the timer is reset whenever a status goes out so heartbeats only fill
//! silence. Exactly one terminal record ends the stream.
//!
//! The pipeline runs in its own task. If the caller disconnects, the task
//! keeps going until it finishes, so anything it owns (like a turn lease)
//! is released on its normal path. A panic in the pipeline still ends the
//! stream with an error record.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;

use crate::store::SnapshotDocument;

/// One record of the progress protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressRecord {
    Status { message: String },
    Heartbeat,
    Created { entity_id: String },
    Complete { snapshot: Box<SnapshotDocument> },
    Error { message: String, retryable: bool },
}

impl ProgressRecord {
    pub fn status(message: impl Into<String>) -> Self {
        ProgressRecord::Status {
            message: message.into(),
        }
    }

    pub fn complete(snapshot: SnapshotDocument) -> Self {
        ProgressRecord::Complete {
            snapshot: Box::new(snapshot),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressRecord::Error {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressRecord::Complete { .. } | ProgressRecord::Error { .. })
    }

    /// Serialize as one NDJSON line, newline included.
    pub fn to_json_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({"type": "error", "message": e.to_string(), "retryable": false})
                .to_string()
        });
        line.push('\n');
        line
    }
}

/// Errors that know whether the caller may retry.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::errors::TurnError {
    fn is_retryable(&self) -> bool {
        crate::errors::TurnError::is_retryable(self)
    }
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Handle a pipeline uses to publish progress.
///
/// Sends never fail from the pipeline's point of view: once the stream is
/// gone, records are dropped.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: Option<mpsc::UnboundedSender<ProgressRecord>>,
}

impl StatusSink {
    /// A sink that discards everything, for callers without a stream.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// A sink paired with a receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn status(&self, message: impl Into<String>) {
        self.send(ProgressRecord::status(message));
    }

    pub fn created(&self, entity_id: impl Into<String>) {
        self.send(ProgressRecord::Created {
            entity_id: entity_id.into(),
        });
    }

    fn send(&self, record: ProgressRecord) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(record);
        }
    }
}

/// Run `pipeline` in a background task and stream its progress.
///
/// `pipeline` receives a [`StatusSink`]; its result becomes the terminal
/// record (`Ok` is passed through, `Err` or a panic becomes an `error` record).
pub fn progress_stream<F, Fut, E>(heartbeat: Duration, pipeline: F) -> ReceiverStream<ProgressRecord>
where
    F: FnOnce(StatusSink) -> Fut + Send + 'static,
    Fut: Future<Output = Result<ProgressRecord, E>> + Send + 'static,
    E: Display + Retryable + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::channel(64);
    let (sink, mut status_rx) = StatusSink::channel();

    tokio::spawn(async move {
        // A panicking pipeline surfaces here as a JoinError
        let mut run = tokio::spawn(async move { pipeline(sink).await });

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Dropped records are fine once the caller is gone
        let mut connected = true;

        let terminal = loop {
            tokio::select! {
                biased;

                Some(record) = status_rx.recv() => {
                    connected = forward(&out_tx, record, connected).await;
                    ticker.reset();
                }
                joined = &mut run => {
                    break match joined {
                        Ok(Ok(record)) => record,
                        Ok(Err(e)) => {
                            tracing::warn!(error = %e, "pipeline failed");
                            ProgressRecord::Error {
                                message: e.to_string(),
                                retryable: e.is_retryable(),
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "pipeline task died");
                            ProgressRecord::error(format!("Pipeline task failed: {e}"))
                        }
                    };
                }
                _ = ticker.tick() => {
                    connected = forward(&out_tx, ProgressRecord::Heartbeat, connected).await;
                }
            }
        };

        // Statuses sent right before the pipeline returned
        while let Ok(record) = status_rx.try_recv() {
            connected = forward(&out_tx, record, connected).await;
        }
        forward(&out_tx, terminal, connected).await;
    });

    ReceiverStream::new(out_rx)
}

async fn forward(tx: &mpsc::Sender<ProgressRecord>, record: ProgressRecord, connected: bool) -> bool {
    if !connected {
        return false;
    }
    if tx.send(record).await.is_err() {
        tracing::debug!("progress stream receiver dropped; pipeline continues");
        return false;
    }
    true
}
