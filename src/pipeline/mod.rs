pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod pacing;

pub use errors::PipelineError;
pub use events::{ChannelSink, EventSink, MemorySink, PipelineEvent, RunSummary};
pub use orchestrator::{
    DiscoveryStage, EligibleRecords, Orchestrator, OrchestratorConfig, RunOutcome, RunState,
};
pub use pacing::{DelayKind, Pacer, RecordingPacer, TokioPacer};
