use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::page_source::SourceError;
use crate::network::NetworkError;

// * Errors that end a run. Everything below record granularity is absorbed earlier.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot start: {0}")]
    FatalPrecondition(#[source] ConfigError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Page source error: {0}")]
    Source(#[from] SourceError),

    #[error("HTTP client setup failed: {0}")]
    Network(#[from] NetworkError),
}

impl PipelineError {
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(self, PipelineError::FatalPrecondition(_))
    }
}
