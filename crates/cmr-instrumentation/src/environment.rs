//! Monitoring profiles assignable to agents
//!
//! An [`Environment`] is a named set of instrumentation rules. Environments
//! are authored outside this crate and arrive here already loaded; the
//! holder validates them before deriving anything from them.

use crate::error::ConfigurationError;
use crate::types::SensorKind;
use serde::{Deserialize, Serialize};

/// Named monitoring profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique environment id
    pub id: String,

    /// Display name
    pub name: String,

    /// Sensor assignments
    #[serde(default)]
    pub sensor_assignments: Vec<SensorAssignment>,

    /// Classes that are never instrumented, whatever the assignments say
    #[serde(default)]
    pub exclude_class_patterns: Vec<String>,
}

impl Environment {
    /// Create environment without rules
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sensor_assignments: Vec::new(),
            exclude_class_patterns: Vec::new(),
        }
    }

    /// With an additional sensor assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: SensorAssignment) -> Self {
        self.sensor_assignments.push(assignment);
        self
    }

    /// With an additional exclude pattern
    #[must_use]
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_class_patterns.push(pattern.into());
        self
    }

    /// Check the environment is well formed
    ///
    /// Pattern syntax is checked when the patterns are compiled.
    ///
    /// # Errors
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.id.trim().is_empty() {
            return Err(ConfigurationError::MissingEnvironmentId);
        }
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::MissingEnvironmentName {
                id: self.id.clone(),
            });
        }

        let empty = |field| ConfigurationError::EmptyPattern {
            environment: self.id.clone(),
            field,
        };
        for assignment in &self.sensor_assignments {
            if assignment.class_pattern.is_empty() {
                return Err(empty("class"));
            }
            if assignment.method_pattern.is_empty() {
                return Err(empty("method"));
            }
        }
        if self.exclude_class_patterns.iter().any(String::is_empty) {
            return Err(empty("exclude"));
        }

        Ok(())
    }
}

/// Assignment of a sensor to the methods matching a class/method pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorAssignment {
    /// Wildcard pattern on the fully-qualified class name
    pub class_pattern: String,

    /// Wildcard pattern on the method name
    #[serde(default = "any_method")]
    pub method_pattern: String,

    /// Sensor to place
    pub sensor: SensorKind,
}

fn any_method() -> String {
    "*".to_string()
}

impl SensorAssignment {
    /// Assign `sensor` to all methods of classes matching `class_pattern`
    #[must_use]
    pub fn new(class_pattern: impl Into<String>, sensor: SensorKind) -> Self {
        Self {
            class_pattern: class_pattern.into(),
            method_pattern: any_method(),
            sensor,
        }
    }

    /// Restrict to methods matching `pattern`
    #[must_use]
    pub fn with_method(mut self, pattern: impl Into<String>) -> Self {
        self.method_pattern = pattern.into();
        self
    }
}
