//! Per-agent configuration holder
//!
//! The holder keeps the environment currently assigned to one agent and the
//! state derived from it. [`ConfigurationHolder::update`] builds the complete
//! derived state before taking the write guard, so a reader sees either the
//! previous state or the new one, never a mix. The two halves are exposed as
//! [`ConfigurationHolder::prepare`] and [`ConfigurationHolder::commit`] for
//! callers that must reject input before touching anything else.

use crate::agent_config::AgentConfiguration;
use crate::applier::{appliers_for, SharedApplier};
use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::types::AgentId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Consistent view of the holder's derived state
#[derive(Debug, Clone)]
pub struct HolderSnapshot {
    /// Derived agent configuration
    pub agent_configuration: Arc<AgentConfiguration>,

    /// Derived appliers
    pub appliers: Arc<[SharedApplier]>,
}

/// Fully derived state waiting to be installed by [`ConfigurationHolder::commit`]
#[derive(Debug)]
pub struct PreparedUpdate {
    agent_id: AgentId,
    environment: Option<Arc<Environment>>,
    agent_configuration: Arc<AgentConfiguration>,
    appliers: Arc<[SharedApplier]>,
}

#[derive(Debug, Default)]
struct HolderState {
    agent_id: Option<AgentId>,
    environment: Option<Arc<Environment>>,
    agent_configuration: Option<Arc<AgentConfiguration>>,
    appliers: Option<Arc<[SharedApplier]>>,
    initialized: bool,
}

/// Current environment and derived instrumentation policy of one agent
#[derive(Debug, Default)]
pub struct ConfigurationHolder {
    state: RwLock<HolderState>,
}

impl ConfigurationHolder {
    /// Create un-initialized holder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the environment and recompute everything derived from it
    ///
    /// Last write wins; nothing from the previous environment is kept. The
    /// first successful call marks the holder initialized.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] for a malformed environment, in which
    /// case the holder is left unchanged.
    pub fn update(
        &self,
        environment: Option<Environment>,
        agent_id: AgentId,
    ) -> Result<(), ConfigurationError> {
        let prepared = Self::prepare(environment, agent_id)?;
        self.commit(prepared);
        Ok(())
    }

    /// Validate `environment` and derive the state an update would install
    ///
    /// Touches no holder state, so callers can reject bad input before
    /// mutating anything else.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] for a malformed environment.
    pub fn prepare(
        environment: Option<Environment>,
        agent_id: AgentId,
    ) -> Result<PreparedUpdate, ConfigurationError> {
        if let Some(env) = &environment {
            env.validate()?;
        }
        let agent_configuration = AgentConfiguration::derive(agent_id, environment.as_ref())?;
        let appliers: Arc<[SharedApplier]> = appliers_for(environment.as_ref())?.into();

        Ok(PreparedUpdate {
            agent_id,
            environment: environment.map(Arc::new),
            agent_configuration: Arc::new(agent_configuration),
            appliers,
        })
    }

    /// Install a prepared update
    pub fn commit(&self, prepared: PreparedUpdate) {
        tracing::info!(
            agent = %prepared.agent_id,
            environment = prepared.environment.as_ref().map_or("<none>", |e| e.id.as_str()),
            appliers = prepared.appliers.len(),
            "configuration holder updated"
        );

        let mut state = self.state.write();
        state.agent_id = Some(prepared.agent_id);
        state.environment = prepared.environment;
        state.agent_configuration = Some(prepared.agent_configuration);
        state.appliers = Some(prepared.appliers);
        state.initialized = true;
    }

    /// Check if the holder has been updated at least once
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Appliers derived from the current environment, empty before the first update
    #[must_use]
    pub fn instrumentation_appliers(&self) -> Arc<[SharedApplier]> {
        self.state
            .read()
            .appliers
            .clone()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Agent configuration derived from the current environment
    #[must_use]
    pub fn agent_configuration(&self) -> Option<Arc<AgentConfiguration>> {
        self.state.read().agent_configuration.clone()
    }

    /// Current environment
    #[must_use]
    pub fn environment(&self) -> Option<Arc<Environment>> {
        self.state.read().environment.clone()
    }

    /// Agent id of the last update
    #[must_use]
    pub fn agent_id(&self) -> Option<AgentId> {
        self.state.read().agent_id
    }

    /// Configuration and appliers taken under one read guard
    ///
    /// `None` before the first update.
    #[must_use]
    pub fn snapshot(&self) -> Option<HolderSnapshot> {
        let state = self.state.read();
        Some(HolderSnapshot {
            agent_configuration: state.agent_configuration.clone()?,
            appliers: state.appliers.clone()?,
        })
    }
}
