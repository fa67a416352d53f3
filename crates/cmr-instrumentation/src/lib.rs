//! CMR Instrumentation
//!
//! Decides, per connected agent, which classes and methods carry
//! instrumentation, and recomputes that decision when the agent's
//! environment changes.
//!
//! # Core Concepts
//!
//! - [`Environment`]: named monitoring profile of sensor assignments
//! - [`ConfigurationHolder`]: an agent's environment and derived policy
//! - [`ClassIndex`]: the agent's class types and their instrumentation points
//! - [`ConfigurationChangeJob`]: one reconfiguration step for one agent
//! - [`EnvironmentMappingUpdateJob`]: swaps the environment of an agent
//! - [`AgentJobScheduler`]: one exclusive execution slot per agent
//!
//! # Example
//!
//! ```rust
//! use cmr_instrumentation::prelude::*;
//! use std::sync::Arc;
//!
//! let index = Arc::new(InMemoryClassIndex::with_classes([ClassDescriptor::new(
//!     ClassType::bootstrap("com.shop.Cart"),
//!     ["add"],
//! )]));
//! let scheduler = AgentJobScheduler::new();
//! scheduler.connect(AgentId(1), index.clone()).unwrap();
//!
//! let env = Environment::new("prod", "Production")
//!     .with_assignment(SensorAssignment::new("com.shop.*", SensorKind::Timer));
//!
//! // First mapping initializes the holder, the second instruments
//! scheduler.map_environment(AgentId(1), Some(env.clone())).unwrap();
//! let changed = scheduler.map_environment(AgentId(1), Some(env)).unwrap();
//! assert!(changed.contains(&ClassType::bootstrap("com.shop.Cart")));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod agent_config;
pub mod applier;
pub mod class_index;
pub mod environment;
pub mod error;
pub mod holder;
pub mod job;
pub mod pattern;
pub mod scheduler;
pub mod types;

// Re-exports
pub use agent_config::AgentConfiguration;
pub use applier::{appliers_for, InstrumentationApplier, SensorAssignmentApplier, SharedApplier};
pub use class_index::{ClassIndex, InMemoryClassIndex};
pub use environment::{Environment, SensorAssignment};
pub use error::{ClassIndexError, ConfigurationError, JobError, SchedulerError};
pub use holder::{ConfigurationHolder, HolderSnapshot, PreparedUpdate};
pub use job::{AgentBinding, ConfigurationChangeJob, EnvironmentMappingUpdateJob};
pub use pattern::WildcardPattern;
pub use scheduler::AgentJobScheduler;
pub use types::{
    AgentId, ChangedTypes, ClassDescriptor, ClassType, InstrumentationPoint, LoaderId, SensorKind,
    BOOTSTRAP_LOADER,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for instrumentation configuration
    pub use crate::{
        AgentBinding, AgentConfiguration, AgentId, AgentJobScheduler, ChangedTypes, ClassDescriptor,
        ClassIndex, ClassType, ConfigurationChangeJob, ConfigurationHolder, Environment,
        EnvironmentMappingUpdateJob, InMemoryClassIndex, InstrumentationApplier, SensorAssignment,
        SensorKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
