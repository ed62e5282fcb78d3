//! Error types for random-walk
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI validation
//! - Walker thread spawning and joining
//!
//! Walkers never put errors on the report channel. Everything here is
//! surfaced by the orchestrator, either before the run starts or after
//! the aggregator has signalled completion.

use thiserror::Error;

/// Top-level error type for a run
#[derive(Error, Debug)]
pub enum RunError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Walker/concurrency errors
    #[error("Walker error: {0}")]
    Walker(#[from] WalkerError),
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Domain half-width must be positive
    #[error("Invalid domain size {size}: must be greater than 0")]
    InvalidDomainSize { size: i64 },

    /// Step budget must not be negative
    #[error("Invalid max steps {steps}: must be 0 or greater")]
    InvalidMaxSteps { steps: i64 },

    /// Walker count out of range
    #[error("Invalid walker count {count}: must be between 1 and {max}")]
    InvalidWalkerCount { count: usize, max: usize },
}

/// Walker thread errors
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Thread could not be spawned
    #[error("Failed to spawn walker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Aggregator thread could not be spawned
    #[error("Failed to spawn aggregator: {0}")]
    AggregatorSpawnFailed(String),

    /// Walker panicked
    #[error("Walker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Aggregator panicked before producing a summary
    #[error("Aggregator panicked: {0}")]
    AggregatorPanicked(String),
}

/// Result type alias for RunError
pub type Result<T> = std::result::Result<T, RunError>;

/// Extract a readable message from a thread panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidDomainSize { size: 0 };
        let run_err: RunError = config_err.into();
        assert!(matches!(run_err, RunError::Config(_)));

        let walker_err = WalkerError::Panicked {
            id: 3,
            message: "boom".into(),
        };
        let run_err: RunError = walker_err.into();
        assert!(matches!(run_err, RunError::Walker(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::InvalidWalkerCount { count: 0, max: 4096 };
        assert_eq!(
            err.to_string(),
            "Invalid walker count 0: must be between 1 and 4096"
        );

        let err = ConfigError::InvalidMaxSteps { steps: -1 };
        assert_eq!(err.to_string(), "Invalid max steps -1: must be 0 or greater");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
