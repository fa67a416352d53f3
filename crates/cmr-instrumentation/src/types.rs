//! Core identifiers and class model

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a connected monitoring agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identity of the class loader that defined a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoaderId(pub u64);

/// Bootstrap loader
pub const BOOTSTRAP_LOADER: LoaderId = LoaderId(0);

/// A class type known to an agent
///
/// Two types are the same only if both the fully-qualified name and the
/// defining loader match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassType {
    fqn: String,
    loader: LoaderId,
}

impl ClassType {
    /// Create class type
    #[must_use]
    pub fn new(fqn: impl Into<String>, loader: LoaderId) -> Self {
        Self {
            fqn: fqn.into(),
            loader,
        }
    }

    /// Class type defined by the bootstrap loader
    #[must_use]
    pub fn bootstrap(fqn: impl Into<String>) -> Self {
        Self::new(fqn, BOOTSTRAP_LOADER)
    }

    /// Fully-qualified name
    #[inline]
    #[must_use]
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// Defining loader
    #[inline]
    #[must_use]
    pub fn loader(&self) -> LoaderId {
        self.loader
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.fqn, self.loader.0)
    }
}

/// A class type together with the methods it declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// The class type
    pub class_type: ClassType,

    /// Declared method names
    #[serde(default)]
    pub methods: Vec<String>,
}

impl ClassDescriptor {
    /// Create descriptor
    #[must_use]
    pub fn new<I, S>(class_type: ClassType, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_type,
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }
}

/// Set of class types whose instrumentation state is affected by a change
pub type ChangedTypes = HashSet<ClassType>;

/// Sensor that can be woven into a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    /// Measures method duration
    Timer,
    /// Records the invocation tree below the method
    InvocationSequence,
    /// Captures thrown exceptions
    Exception,
    /// Captures JDBC statements
    Sql,
    /// Captures HTTP request data
    Http,
}

/// A bytecode-level hook on one method of a class
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InstrumentationPoint {
    /// Method the point is placed on
    pub method: String,

    /// Sensor woven at the point
    pub sensor: SensorKind,
}

impl InstrumentationPoint {
    /// Create point
    #[must_use]
    pub fn new(method: impl Into<String>, sensor: SensorKind) -> Self {
        Self {
            method: method.into(),
            sensor,
        }
    }
}
