//! Composition root
//!
//! [`ControlPlane`] owns the process-wide services: the business context
//! registry and the agent job scheduler. It is built once at startup from a
//! [`ServerConfig`] and shared by reference from there on.

use crate::config::{AgentEntry, ServerConfig};
use crate::error::ControlPlaneError;
use cmr_business::BusinessContextRegistry;
use cmr_instrumentation::{AgentId, AgentJobScheduler, ChangedTypes, ClassIndex, Environment, InMemoryClassIndex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide services of the server
#[derive(Debug)]
pub struct ControlPlane {
    registry: Arc<BusinessContextRegistry>,
    scheduler: Arc<AgentJobScheduler>,
    environments: HashMap<String, Environment>,
}

impl ControlPlane {
    /// Build services from `config` and seed the registry
    ///
    /// Does not validate `config`; [`ServerConfig::load`] and
    /// [`ServerConfig::from_toml_str`] already have. An agent that names an
    /// unknown environment fails later in [`ControlPlane::map_environment`].
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let registry = Arc::new(BusinessContextRegistry::new());
        for application in &config.applications {
            registry.register_definition(application);
        }

        let environments = config
            .environments
            .iter()
            .map(|env| (env.id.clone(), env.clone()))
            .collect();

        tracing::info!(
            environments = config.environments.len(),
            applications = registry.application_count(),
            "control plane ready"
        );

        Self {
            registry,
            scheduler: Arc::new(AgentJobScheduler::new()),
            environments,
        }
    }

    /// Business context registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<BusinessContextRegistry> {
        &self.registry
    }

    /// Agent job scheduler
    #[inline]
    #[must_use]
    pub fn scheduler(&self) -> &Arc<AgentJobScheduler> {
        &self.scheduler
    }

    /// Connect an agent backed by an in-memory class index holding its
    /// reported classes
    ///
    /// # Errors
    /// Returns [`ControlPlaneError::Scheduler`] if the agent is already connected.
    pub fn connect(&self, agent: &AgentEntry) -> Result<(), ControlPlaneError> {
        let index: Arc<dyn ClassIndex> =
            Arc::new(InMemoryClassIndex::with_classes(agent.class_descriptors()));
        self.scheduler.connect(agent.id, index)?;
        Ok(())
    }

    /// Map the environment `environment_id` (or none) to `agent_id`
    ///
    /// Returns the class types that must be re-pushed to the agent.
    ///
    /// # Errors
    /// Returns [`ControlPlaneError::UnknownEnvironment`] for an unknown id and
    /// [`ControlPlaneError::Scheduler`] if the job cannot run or fails.
    pub fn map_environment(
        &self,
        agent_id: AgentId,
        environment_id: Option<&str>,
    ) -> Result<ChangedTypes, ControlPlaneError> {
        let environment = environment_id
            .map(|id| {
                self.environments
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ControlPlaneError::UnknownEnvironment(id.to_string()))
            })
            .transpose()?;
        Ok(self.scheduler.map_environment(agent_id, environment)?)
    }

    /// Connect every configured agent and apply its mapping
    ///
    /// The first mapping initializes an agent's holder; the second applies
    /// the environment to the now analysed class index.
    ///
    /// # Errors
    /// Stops at the first agent that fails.
    pub fn bootstrap(&self, config: &ServerConfig) -> Result<RunReport, ControlPlaneError> {
        let mut agents = Vec::with_capacity(config.agents.len());
        for agent in &config.agents {
            self.connect(agent)?;
            let environment = agent.environment.as_deref();
            self.map_environment(agent.id, environment)?;
            let changed = self.map_environment(agent.id, environment)?;
            agents.push(AgentReport::new(agent.id, environment, &changed));
        }
        agents.sort_by_key(|a| a.agent);

        Ok(RunReport {
            agents,
            applications: self.application_summaries(),
        })
    }

    /// Registered applications with their business transactions, sorted by id
    #[must_use]
    pub fn application_summaries(&self) -> Vec<ApplicationSummary> {
        let mut summaries: Vec<_> = self
            .registry
            .applications()
            .into_iter()
            .map(|app| {
                let mut business_transactions: Vec<_> = self
                    .registry
                    .business_transactions_for(app.id())
                    .iter()
                    .map(|tx| tx.name().to_string())
                    .collect();
                business_transactions.sort();
                ApplicationSummary {
                    id: app.id(),
                    name: app.name().to_string(),
                    business_transactions,
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.id);
        summaries
    }
}

/// Outcome of [`ControlPlane::bootstrap`]
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Per-agent results, sorted by agent id
    pub agents: Vec<AgentReport>,
    /// Registered applications
    pub applications: Vec<ApplicationSummary>,
}

/// Instrumentation result for one agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    /// Agent id
    pub agent: AgentId,
    /// Mapped environment
    pub environment: Option<String>,
    /// Types to re-push, sorted
    pub changed_types: Vec<String>,
}

impl AgentReport {
    fn new(agent: AgentId, environment: Option<&str>, changed: &ChangedTypes) -> Self {
        let mut changed_types: Vec<_> = changed.iter().map(ToString::to_string).collect();
        changed_types.sort();
        Self {
            agent,
            environment: environment.map(str::to_string),
            changed_types,
        }
    }
}

/// Registered application
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    /// Derived application id
    pub id: i32,
    /// Application name
    pub name: String,
    /// Names of its business transactions, sorted
    pub business_transactions: Vec<String>,
}

impl RunReport {
    /// Human readable rendering
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::from("Instrumentation\n===============\n");
        for agent in &self.agents {
            out.push_str(&format!(
                "{} [{}]: {} type(s) to push\n",
                agent.agent,
                agent.environment.as_deref().unwrap_or("no environment"),
                agent.changed_types.len()
            ));
            for ty in &agent.changed_types {
                out.push_str(&format!("  {ty}\n"));
            }
        }
        out.push_str("\nApplications\n============\n");
        for app in &self.applications {
            out.push_str(&format!("{} ({})\n", app.name, app.id));
            for tx in &app.business_transactions {
                out.push_str(&format!("  {tx}\n"));
            }
        }
        out
    }
}
