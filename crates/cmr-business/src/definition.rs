//! Business context definitions
//!
//! Definitions are authored elsewhere and handed to the registry. Names are
//! required fields: a definition without a name fails to deserialize, so an
//! absent name never reaches [`derive_instance_id`](crate::derive_instance_id).

use crate::id::DefinitionId;
use serde::{Deserialize, Serialize};

/// Definition of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDefinition {
    /// Definition id, `0` for the default application
    pub id: DefinitionId,

    /// Application name
    pub application_name: String,

    /// Business transaction definitions belonging to this application
    #[serde(default)]
    pub business_transactions: Vec<BusinessTransactionDefinition>,
}

impl ApplicationDefinition {
    /// Create definition without business transactions
    #[must_use]
    pub fn new(id: DefinitionId, application_name: impl Into<String>) -> Self {
        Self {
            id,
            application_name: application_name.into(),
            business_transactions: Vec::new(),
        }
    }

    /// The default application definition
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(0, "Unknown Application")
    }

    /// With an additional business transaction definition
    #[must_use]
    pub fn with_business_transaction(mut self, definition: BusinessTransactionDefinition) -> Self {
        self.business_transactions.push(definition);
        self
    }
}

/// Definition of a business transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessTransactionDefinition {
    /// Definition id, `0` for the default business transaction
    pub id: DefinitionId,

    /// Business transaction name
    pub business_transaction_name: String,
}

impl BusinessTransactionDefinition {
    /// Create definition
    #[must_use]
    pub fn new(id: DefinitionId, business_transaction_name: impl Into<String>) -> Self {
        Self {
            id,
            business_transaction_name: business_transaction_name.into(),
        }
    }

    /// The default business transaction definition
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(0, "Unknown Transaction")
    }
}
