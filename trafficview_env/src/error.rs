//! Error types for the TrafficView environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// The user refused the location permission prompt
    #[error("Geolocation permission denied")]
    GeolocationDenied,
    
    /// The platform has no geolocation capability
    #[error("Geolocation is not supported by this platform")]
    GeolocationUnsupported,
    
    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
    
    /// The view layer rejected an instruction
    #[error("View error: {0}")]
    ViewError(String),
    
    /// Context operation failed
    #[error("Context error: {0}")]
    ContextError(String),
}
