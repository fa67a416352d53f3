//! Per-agent class index contract
//!
//! The class index tracks the class types an agent has reported and the
//! instrumentation points currently applied to them. Its query engine lives
//! outside this crate; jobs only rely on the three operations of
//! [`ClassIndex`]. [`InMemoryClassIndex`] is a straightforward implementation
//! used by the server binary and the tests.

mod memory;

pub use memory::InMemoryClassIndex;

use crate::agent_config::AgentConfiguration;
use crate::applier::SharedApplier;
use crate::error::ClassIndexError;
use crate::types::ChangedTypes;
use std::fmt::Debug;

/// Read and write access to an agent's class index
pub trait ClassIndex: Debug + Send + Sync {
    /// Point-in-time snapshot of the types that carry instrumentation points
    fn find_instrumented_types(&self) -> ChangedTypes;

    /// Remove every instrumentation point from every type
    ///
    /// # Errors
    /// Returns [`ClassIndexError`] if the index cannot be written.
    fn remove_instrumentation_points(&self) -> Result<(), ClassIndexError>;

    /// Apply `appliers` to all known types and return the types that received
    /// instrumentation points
    ///
    /// Implementations must not leave a partial application behind on error.
    ///
    /// # Errors
    /// Returns [`ClassIndexError`] if instrumentation could not be applied.
    fn add_instrumentation_points(
        &self,
        config: &AgentConfiguration,
        appliers: &[SharedApplier],
    ) -> Result<ChangedTypes, ClassIndexError>;
}
