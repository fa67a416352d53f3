//! Error types for the CMR server

use cmr_instrumentation::{AgentId, ConfigurationError, SchedulerError};
use std::path::PathBuf;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the expected schema
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two environments share an id
    #[error("duplicate environment id: {0}")]
    DuplicateEnvironment(String),

    /// Environment is malformed
    #[error("invalid environment {id}: {source}")]
    InvalidEnvironment {
        /// Environment id
        id: String,
        /// Why it was rejected
        #[source]
        source: ConfigurationError,
    },

    /// Two agents share an id
    #[error("duplicate agent: {0}")]
    DuplicateAgent(AgentId),

    /// Agent mapped to an environment that is not defined
    #[error("{agent} is mapped to unknown environment {environment:?}")]
    UnknownEnvironment {
        /// Agent id
        agent: AgentId,
        /// Missing environment id
        environment: String,
    },

    /// Log filter or subscriber setup failed
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Control plane errors
#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    /// Environment id is not known
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Scheduling or job execution failed
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
