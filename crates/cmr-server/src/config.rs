//! Server configuration file
//!
//! The server reads one TOML file holding logging settings, the known
//! environments, the agents to connect with their environment mapping and
//! reported classes, and the application definitions to seed the registry
//! with.
//!
//! ```toml
//! [logging]
//! filter = "info,cmr_instrumentation=debug"
//! format = "json"
//!
//! [[environments]]
//! id = "prod"
//! name = "Production"
//!
//! [[environments.sensor_assignments]]
//! class_pattern = "com.shop.*Service"
//! sensor = "timer"
//!
//! [[agents]]
//! id = 1
//! environment = "prod"
//!
//! [[agents.classes]]
//! fqn = "com.shop.CartService"
//! methods = ["add"]
//! ```

use crate::error::ServerConfigError;
use cmr_business::ApplicationDefinition;
use cmr_instrumentation::{AgentId, ClassDescriptor, ClassType, Environment, LoaderId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Known environments
    #[serde(default)]
    pub environments: Vec<Environment>,

    /// Agents to connect
    #[serde(default)]
    pub agents: Vec<AgentEntry>,

    /// Application definitions
    #[serde(default)]
    pub applications: Vec<ApplicationDefinition>,
}

impl ServerConfig {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate configuration from `path`
    ///
    /// # Errors
    /// Returns [`ServerConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ServerConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            environments = config.environments.len(),
            agents = config.agents.len(),
            applications = config.applications.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    /// Returns [`ServerConfigError`] if the text cannot be parsed or validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ServerConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross references and environment well-formedness
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ServerConfigError> {
        let mut environment_ids = HashSet::new();
        for env in &self.environments {
            if !environment_ids.insert(env.id.as_str()) {
                return Err(ServerConfigError::DuplicateEnvironment(env.id.clone()));
            }
            env.validate()
                .map_err(|source| ServerConfigError::InvalidEnvironment {
                    id: env.id.clone(),
                    source,
                })?;
        }

        let mut agent_ids = HashSet::new();
        for agent in &self.agents {
            if !agent_ids.insert(agent.id) {
                return Err(ServerConfigError::DuplicateAgent(agent.id));
            }
            if let Some(environment) = &agent.environment {
                if !environment_ids.contains(environment.as_str()) {
                    return Err(ServerConfigError::UnknownEnvironment {
                        agent: agent.id,
                        environment: environment.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// With an additional environment
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environments.push(environment);
        self
    }

    /// With an additional agent
    #[must_use]
    pub fn with_agent(mut self, agent: AgentEntry) -> Self {
        self.agents.push(agent);
        self
    }

    /// With an additional application definition
    #[must_use]
    pub fn with_application(mut self, application: ApplicationDefinition) -> Self {
        self.applications.push(application);
        self
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// An agent to connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Agent id
    pub id: AgentId,

    /// Id of the mapped environment, none for an unmapped agent
    #[serde(default)]
    pub environment: Option<String>,

    /// Classes the agent has reported
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

impl AgentEntry {
    /// Create unmapped agent without classes
    #[must_use]
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            environment: None,
            classes: Vec::new(),
        }
    }

    /// Mapped to `environment`
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// With an additional class
    #[must_use]
    pub fn with_class(mut self, class: ClassEntry) -> Self {
        self.classes.push(class);
        self
    }

    /// Reported classes as descriptors
    #[must_use]
    pub fn class_descriptors(&self) -> Vec<ClassDescriptor> {
        self.classes.iter().map(ClassEntry::to_descriptor).collect()
    }
}

/// A class reported by an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Fully-qualified class name
    pub fqn: String,

    /// Defining loader, bootstrap when omitted
    #[serde(default)]
    pub loader: LoaderId,

    /// Declared methods
    #[serde(default)]
    pub methods: Vec<String>,
}

impl ClassEntry {
    /// Create class entry defined by the bootstrap loader
    #[must_use]
    pub fn new<I, S>(fqn: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fqn: fqn.into(),
            loader: LoaderId::default(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    fn to_descriptor(&self) -> ClassDescriptor {
        ClassDescriptor::new(ClassType::new(self.fqn.as_str(), self.loader), self.methods.iter().cloned())
    }
}
