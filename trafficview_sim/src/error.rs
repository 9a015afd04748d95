//! Harness errors.

use thiserror::Error;
use trafficview_core::NavError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Failed to build simulation runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to write export: {0}")]
    Export(#[from] std::io::Error),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] NavError),
}
