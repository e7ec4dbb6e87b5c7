// * Named, fixed delays. The page gives no readiness signal, so these are plain sleeps.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayKind {
    /// Wait for client-rendered content after navigation
    Settle,
    /// Gap between consecutive generation calls
    Pacing,
}

pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub trait Pacer: Send + Sync {
    fn pause(&self, kind: DelayKind, duration: Duration) -> PauseFuture<'_>;
}

/// Real sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, kind: DelayKind, duration: Duration) -> PauseFuture<'_> {
        Box::pin(async move {
            debug!(?kind, ms = duration.as_millis() as u64, "Pausing");
            tokio::time::sleep(duration).await;
        })
    }
}

/// Records requested pauses without sleeping
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(DelayKind, Duration)>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<(DelayKind, Duration)> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn count(&self, kind: DelayKind) -> usize {
        self.pauses().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, kind: DelayKind, duration: Duration) -> PauseFuture<'_> {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push((kind, duration));
        }
        Box::pin(async {})
    }
}
