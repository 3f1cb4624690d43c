//! Configuration error types

use thiserror::Error;

/// Errors raised while resolving configuration.
///
/// All of these fail the assembly before a single resource is emitted;
/// there is no partial-success state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unrecognized environment label: {0}")]
    UnknownEnvironment(String),

    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("configuration field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("duplicate routing priority {priority} on listener {listener}")]
    DuplicatePriority { listener: String, priority: u32 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
