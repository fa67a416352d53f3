//! Per-agent job scheduling
//!
//! Provides [`AgentJobScheduler`], which owns the binding of every connected
//! agent and a single execution slot per agent. A job only runs while its
//! agent's slot is held, so two jobs never interleave on the same holder and
//! class index. Jobs for different agents run in parallel.

use crate::class_index::ClassIndex;
use crate::environment::Environment;
use crate::error::SchedulerError;
use crate::holder::ConfigurationHolder;
use crate::job::{AgentBinding, ConfigurationChangeJob, EnvironmentMappingUpdateJob};
use crate::types::{AgentId, ChangedTypes};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct AgentSlot {
    binding: AgentBinding,
    exclusive: Mutex<()>,
}

/// Runs configuration change jobs with one exclusive slot per agent
#[derive(Debug, Default)]
pub struct AgentJobScheduler {
    slots: DashMap<AgentId, Arc<AgentSlot>>,
}

impl AgentJobScheduler {
    /// Create scheduler with no connected agents
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected agent with a fresh configuration holder
    ///
    /// # Errors
    /// Returns [`SchedulerError::AgentAlreadyConnected`] if `agent_id` is
    /// already registered.
    pub fn connect(
        &self,
        agent_id: AgentId,
        class_index: Arc<dyn ClassIndex>,
    ) -> Result<AgentBinding, SchedulerError> {
        match self.slots.entry(agent_id) {
            Entry::Occupied(_) => Err(SchedulerError::AgentAlreadyConnected(agent_id)),
            Entry::Vacant(vacant) => {
                let binding =
                    AgentBinding::new(agent_id, Arc::new(ConfigurationHolder::new()), class_index);
                vacant.insert(Arc::new(AgentSlot {
                    binding: binding.clone(),
                    exclusive: Mutex::new(()),
                }));
                tracing::info!(agent = %agent_id, "agent connected");
                Ok(binding)
            }
        }
    }

    /// Drop the agent's binding
    ///
    /// A job already running for the agent finishes on the binding it holds.
    /// Returns `false` if the agent was not connected.
    pub fn disconnect(&self, agent_id: AgentId) -> bool {
        let removed = self.slots.remove(&agent_id).is_some();
        if removed {
            tracing::info!(agent = %agent_id, "agent disconnected");
        }
        removed
    }

    /// Binding of a connected agent
    #[must_use]
    pub fn binding(&self, agent_id: AgentId) -> Option<AgentBinding> {
        self.slots.get(&agent_id).map(|slot| slot.binding.clone())
    }

    /// Ids of all connected agents, unordered
    #[must_use]
    pub fn connected_agents(&self) -> Vec<AgentId> {
        self.slots.iter().map(|slot| *slot.key()).collect()
    }

    /// Build a job for `agent_id` and run it while holding the agent's slot
    ///
    /// Blocks until any job already running for the same agent has finished.
    ///
    /// # Errors
    /// Returns [`SchedulerError::AgentNotConnected`] for an unknown agent and
    /// [`SchedulerError::Job`] if the job fails.
    pub fn run<J, F>(&self, agent_id: AgentId, make_job: F) -> Result<ChangedTypes, SchedulerError>
    where
        J: ConfigurationChangeJob,
        F: FnOnce(AgentBinding) -> J,
    {
        // Clone the slot out so the map shard is not held while waiting
        let slot = self
            .slots
            .get(&agent_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(SchedulerError::AgentNotConnected(agent_id))?;

        let _token = slot.exclusive.lock();
        let job = make_job(slot.binding.clone());
        debug_assert_eq!(job.binding().agent_id(), agent_id);
        tracing::debug!(agent = %agent_id, job = J::NAME, "executing job");

        match job.execute() {
            Ok(changed) => {
                tracing::debug!(agent = %agent_id, job = J::NAME, changed = changed.len(), "job finished");
                Ok(changed)
            }
            Err(source) => {
                tracing::warn!(agent = %agent_id, job = J::NAME, error = %source, "job failed");
                Err(SchedulerError::Job {
                    agent: agent_id,
                    source,
                })
            }
        }
    }

    /// Map `environment` to `agent_id` and return the types to re-push
    ///
    /// # Errors
    /// See [`AgentJobScheduler::run`].
    pub fn map_environment(
        &self,
        agent_id: AgentId,
        environment: Option<Environment>,
    ) -> Result<ChangedTypes, SchedulerError> {
        self.run(agent_id, |binding| {
            EnvironmentMappingUpdateJob::new(binding, environment)
        })
    }
}
