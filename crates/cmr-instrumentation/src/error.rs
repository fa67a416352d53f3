//! Error types for CMR instrumentation
//!
//! Provides error handling for:
//! - Rejected environments (holder update)
//! - Class index failures
//! - Configuration change job failures
//! - Scheduler lookups

use crate::types::AgentId;

/// Environment rejected by [`ConfigurationHolder::update`](crate::ConfigurationHolder::update)
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Environment has no id
    #[error("environment id must not be empty")]
    MissingEnvironmentId,

    /// Environment has no name
    #[error("environment {id} has an empty name")]
    MissingEnvironmentName {
        /// Environment id
        id: String,
    },

    /// Pattern is empty
    #[error("environment {environment}: empty {field} pattern")]
    EmptyPattern {
        /// Environment id
        environment: String,
        /// Which pattern field
        field: &'static str,
    },

    /// Pattern does not compile
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Class index failures
#[derive(Debug, thiserror::Error)]
pub enum ClassIndexError {
    /// Index cannot be written
    #[error("class index unavailable: {0}")]
    Unavailable(String),

    /// Applying instrumentation failed
    #[error("instrumentation failed for {class}: {reason}")]
    InstrumentationFailed {
        /// Class being instrumented
        class: String,
        /// Failure reason
        reason: String,
    },
}

/// Configuration change job failures
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Holder rejected the new environment
    #[error("configuration update rejected: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Removing instrumentation points failed
    #[error("clearing instrumentation failed: {0}")]
    Clear(#[source] ClassIndexError),

    /// Re-instrumentation failed, index left fully cleared
    #[error("re-instrumentation failed, class index cleared: {0}")]
    Reinstrumentation(#[source] ClassIndexError),

    /// Holder reports initialized but has no derived configuration
    #[error("holder for {0} has no agent configuration")]
    MissingConfiguration(AgentId),
}

/// Scheduler failures
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Agent is not connected
    #[error("agent not connected: {0}")]
    AgentNotConnected(AgentId),

    /// Agent is already connected
    #[error("agent already connected: {0}")]
    AgentAlreadyConnected(AgentId),

    /// Job failed
    #[error("job failed for {agent}: {source}")]
    Job {
        /// Agent the job ran for
        agent: AgentId,
        /// Underlying job error
        #[source]
        source: JobError,
    },
}

impl SchedulerError {
    /// Check if the error came from job execution
    #[inline]
    #[must_use]
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::Job { .. })
    }
}
