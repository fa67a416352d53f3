//! Identified applications and business transactions
//!
//! Records are immutable once built. The registry publishes them behind
//! [`Arc`] so every caller sees either nothing or a complete value.

use crate::id::{DefinitionId, InstanceId};
use std::sync::Arc;

/// An identified application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationData {
    id: InstanceId,
    definition_id: DefinitionId,
    name: String,
}

impl ApplicationData {
    pub(crate) fn new(id: InstanceId, definition_id: DefinitionId, name: impl Into<String>) -> Self {
        Self {
            id,
            definition_id,
            name: name.into(),
        }
    }

    /// Derived instance id
    #[inline]
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Id of the definition this application was identified by
    #[inline]
    #[must_use]
    pub fn definition_id(&self) -> DefinitionId {
        self.definition_id
    }

    /// Application name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An identified business transaction within an application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessTransactionData {
    id: InstanceId,
    definition_id: DefinitionId,
    application: Arc<ApplicationData>,
    name: String,
}

impl BusinessTransactionData {
    pub(crate) fn new(
        id: InstanceId,
        definition_id: DefinitionId,
        application: Arc<ApplicationData>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            definition_id,
            application,
            name: name.into(),
        }
    }

    /// Derived instance id, unique within the owning application
    #[inline]
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Id of the definition this transaction was identified by
    #[inline]
    #[must_use]
    pub fn definition_id(&self) -> DefinitionId {
        self.definition_id
    }

    /// Owning application
    #[inline]
    #[must_use]
    pub fn application(&self) -> &Arc<ApplicationData> {
        &self.application
    }

    /// Business transaction name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
