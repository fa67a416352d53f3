//! Configuration change jobs
//!
//! A job is one unit of reconfiguration work for one agent. It is bound to
//! the agent's [`ConfigurationHolder`] and [`ClassIndex`] when it is built,
//! and [`ConfigurationChangeJob::execute`] consumes it, so a job can run at
//! most once.
//!
//! # Exclusion
//!
//! Jobs do not lock across their steps. At most one job may run against a
//! given binding at a time; [`AgentJobScheduler`](crate::AgentJobScheduler)
//! enforces this with a per-agent execution token. Jobs for different agents
//! are independent.

mod environment_mapping;

pub use environment_mapping::EnvironmentMappingUpdateJob;

use crate::class_index::ClassIndex;
use crate::error::JobError;
use crate::holder::ConfigurationHolder;
use crate::types::{AgentId, ChangedTypes};
use std::sync::Arc;

/// The `(holder, class index)` pair of one agent
#[derive(Debug, Clone)]
pub struct AgentBinding {
    agent_id: AgentId,
    holder: Arc<ConfigurationHolder>,
    class_index: Arc<dyn ClassIndex>,
}

impl AgentBinding {
    /// Bind `holder` and `class_index` to `agent_id`
    #[must_use]
    pub fn new(
        agent_id: AgentId,
        holder: Arc<ConfigurationHolder>,
        class_index: Arc<dyn ClassIndex>,
    ) -> Self {
        Self {
            agent_id,
            holder,
            class_index,
        }
    }

    /// Agent id
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Configuration holder
    #[inline]
    #[must_use]
    pub fn holder(&self) -> &ConfigurationHolder {
        &self.holder
    }

    /// Class index
    #[inline]
    #[must_use]
    pub fn class_index(&self) -> &dyn ClassIndex {
        self.class_index.as_ref()
    }
}

/// A unit of reconfiguration work bound to one agent
pub trait ConfigurationChangeJob {
    /// Short job name for diagnostics
    const NAME: &'static str;

    /// Binding the job operates on
    fn binding(&self) -> &AgentBinding;

    /// Run the job
    ///
    /// Returns the class types whose instrumentation is affected. The set may
    /// contain types whose instrumentation did not actually change.
    ///
    /// # Errors
    /// Returns [`JobError`] when the change cannot be applied; see the
    /// implementing job for the state it leaves behind.
    fn execute(self) -> Result<ChangedTypes, JobError>;
}
