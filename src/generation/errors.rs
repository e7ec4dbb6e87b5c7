use thiserror::Error;

use crate::config::ConfigError;
use crate::network::NetworkError;

// * Failure of a single endpoint attempt. Absorbed by the generation client, never returned.
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Endpoint misconfigured: {0}")]
    Config(#[from] ConfigError),

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response carried no text")]
    EmptyText,
}
