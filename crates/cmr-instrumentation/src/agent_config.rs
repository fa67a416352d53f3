//! Agent configuration derived from an environment

use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::pattern::WildcardPattern;
use crate::types::{AgentId, SensorKind};
use std::collections::BTreeSet;

/// Configuration an agent runs with, derived from its environment
///
/// An agent without an environment still gets a configuration; it simply
/// enables no sensors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfiguration {
    agent_id: AgentId,
    environment_id: Option<String>,
    sensors: BTreeSet<SensorKind>,
    excludes: Vec<WildcardPattern>,
}

impl AgentConfiguration {
    /// Derive configuration for `agent_id` from `environment`
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if an exclude pattern does not compile.
    pub fn derive(
        agent_id: AgentId,
        environment: Option<&Environment>,
    ) -> Result<Self, ConfigurationError> {
        let Some(environment) = environment else {
            return Ok(Self::empty(agent_id));
        };

        let excludes = environment
            .exclude_class_patterns
            .iter()
            .map(|p| WildcardPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            agent_id,
            environment_id: Some(environment.id.clone()),
            sensors: environment
                .sensor_assignments
                .iter()
                .map(|a| a.sensor)
                .collect(),
            excludes,
        })
    }

    /// Configuration with no environment
    #[must_use]
    pub fn empty(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            environment_id: None,
            sensors: BTreeSet::new(),
            excludes: Vec::new(),
        }
    }

    /// Agent this configuration belongs to
    #[inline]
    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Id of the environment the configuration was derived from
    #[inline]
    #[must_use]
    pub fn environment_id(&self) -> Option<&str> {
        self.environment_id.as_deref()
    }

    /// Sensors enabled for the agent
    #[inline]
    #[must_use]
    pub fn sensors(&self) -> &BTreeSet<SensorKind> {
        &self.sensors
    }

    /// Check if `fqn` must never be instrumented
    #[must_use]
    pub fn is_excluded(&self, fqn: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(fqn))
    }
}
