//! Progress events and the bounded, non-blocking sink the scanner and
//! generator publish them through.

use chrono::{DateTime, Utc};

/// A single progress tick. `total == -1` signals streaming mode (the total
/// item count is not known yet); the final event of a stage sets
/// `total == current`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Progress {
    pub current: i64,
    pub total: i64,
    pub stage: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Progress {
    pub fn new(current: i64, total: i64, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            stage: stage.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The consumer side of a scanner/generator progress stream.
///
/// Implementors MUST NOT block the producer: `send` is expected to return
/// quickly even under backpressure (e.g. by dropping the event). A `None`
/// sink is always valid and means "no one is listening".
pub trait ProgressSink: Send + Sync {
    fn send(&self, progress: Progress);
}

/// A sink backed by a bounded `std::sync::mpsc` channel. `send` never
/// blocks: if the channel is full, the event is silently dropped.
pub struct ChannelProgressSink {
    tx: std::sync::mpsc::SyncSender<Progress>,
}

impl ChannelProgressSink {
    pub fn new(capacity: usize) -> (Self, std::sync::mpsc::Receiver<Progress>) {
        let (tx, rx) = std::sync::mpsc::sync_channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn send(&self, progress: Progress) {
        // Non-blocking, drop-on-full per the design's backpressure policy.
        let _ = self.tx.try_send(progress);
    }
}

/// Sends progress events directly to a closure, for callers who just want
/// coarse stage notifications (the LLM layer uses this rather than a
/// channel, since it is a synchronous callback invoked on the calling
/// thread).
impl<F: Fn(Progress) + Send + Sync> ProgressSink for F {
    fn send(&self, progress: Progress) {
        self(progress)
    }
}

pub(crate) fn emit(sink: Option<&dyn ProgressSink>, progress: Progress) {
    if let Some(sink) = sink {
        sink.send(progress);
    }
}
