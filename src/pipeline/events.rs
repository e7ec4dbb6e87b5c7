// * Pipeline events
// * The orchestrator's only way of talking to the operator. Sinks must not block.

use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::generation::GenerationOutcome;

/// Counts reported at the end of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub excluded: usize,
    pub pasted: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Free-form status line
    Status(String),
    /// Current page was not a listing view; operator sent to `to`
    Redirecting { from: String, to: String },
    /// A record dropped by the classification rules
    Excluded { title: String, reason: String },
    /// Discovery and filtering finished
    Discovered {
        found: usize,
        eligible: usize,
        tier: Option<&'static str>,
    },
    /// Nothing left to generate for
    NoneFound { hint: String },
    RecordStarted { index: usize, total: usize, title: String },
    RecordOutcome {
        index: usize,
        total: usize,
        outcome: GenerationOutcome,
    },
    /// Result of the one-shot paste attempt for a record
    PasteResult {
        index: usize,
        reference: String,
        ok: bool,
        detail: String,
    },
    Summary(RunSummary),
    /// The run stopped early; the reason is meant for humans
    Aborted { reason: String },
}

/// Receives pipeline events. Implementations must return promptly.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to a reporter task over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PipelineEvent) {
        // * A dismissed reporter is not the pipeline's problem
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.emit(PipelineEvent::Status("still fine".into()));
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.emit(PipelineEvent::Status("a".into()));
        sink.emit(PipelineEvent::Status("b".into()));
        assert_eq!(rx.recv().await, Some(PipelineEvent::Status("a".into())));
        assert_eq!(rx.recv().await, Some(PipelineEvent::Status("b".into())));
    }
}
