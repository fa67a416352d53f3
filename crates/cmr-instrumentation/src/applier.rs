//! Instrumentation appliers
//!
//! An applier is the policy half of instrumentation: given a class and the
//! agent configuration it decides which points apply. The class index owns
//! the points themselves.

use crate::agent_config::AgentConfiguration;
use crate::environment::{Environment, SensorAssignment};
use crate::error::ConfigurationError;
use crate::pattern::WildcardPattern;
use crate::types::{ClassDescriptor, InstrumentationPoint, SensorKind};
use std::fmt::Debug;
use std::sync::Arc;

/// Policy deciding which instrumentation points apply to a class
pub trait InstrumentationApplier: Debug + Send + Sync {
    /// Points this applier places on `class`, empty if it does not apply
    fn instrumentation_points(
        &self,
        config: &AgentConfiguration,
        class: &ClassDescriptor,
    ) -> Vec<InstrumentationPoint>;
}

/// Shared applier handle
pub type SharedApplier = Arc<dyn InstrumentationApplier>;

/// Applier for one [`SensorAssignment`]
#[derive(Debug, Clone)]
pub struct SensorAssignmentApplier {
    class_pattern: WildcardPattern,
    method_pattern: WildcardPattern,
    sensor: SensorKind,
}

impl SensorAssignmentApplier {
    /// Compile applier for `assignment`
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidPattern`] if a pattern does not compile.
    pub fn new(assignment: &SensorAssignment) -> Result<Self, ConfigurationError> {
        Ok(Self {
            class_pattern: WildcardPattern::new(&assignment.class_pattern)?,
            method_pattern: WildcardPattern::new(&assignment.method_pattern)?,
            sensor: assignment.sensor,
        })
    }
}

impl InstrumentationApplier for SensorAssignmentApplier {
    fn instrumentation_points(
        &self,
        config: &AgentConfiguration,
        class: &ClassDescriptor,
    ) -> Vec<InstrumentationPoint> {
        let fqn = class.class_type.fqn();
        if !config.sensors().contains(&self.sensor)
            || config.is_excluded(fqn)
            || !self.class_pattern.matches(fqn)
        {
            return Vec::new();
        }

        class
            .methods
            .iter()
            .filter(|m| self.method_pattern.matches(m))
            .map(|m| InstrumentationPoint::new(m.as_str(), self.sensor))
            .collect()
    }
}

/// Build the applier set for `environment`
///
/// No environment means no appliers.
///
/// # Errors
/// Returns the first pattern compilation failure.
pub fn appliers_for(environment: Option<&Environment>) -> Result<Vec<SharedApplier>, ConfigurationError> {
    let Some(environment) = environment else {
        return Ok(Vec::new());
    };

    environment
        .sensor_assignments
        .iter()
        .map(|a| SensorAssignmentApplier::new(a).map(|applier| Arc::new(applier) as SharedApplier))
        .collect()
}
