//! CMR Business Context
//!
//! Stable, deduplicated identities for applications and business
//! transactions.
//!
//! # Overview
//!
//! - **derive_instance_id**: pure id derivation from `(name, definition id)`
//! - **BusinessContextRegistry**: append-only concurrent registry
//! - **ApplicationData / BusinessTransactionData**: immutable records
//!
//! # Example
//!
//! ```rust
//! use cmr_business::{ApplicationDefinition, BusinessContextRegistry, BusinessTransactionDefinition};
//!
//! let registry = BusinessContextRegistry::new();
//! let app = registry.register_application(&ApplicationDefinition::new(1, "shop"));
//! let tx = registry.register_business_transaction(
//!     &app,
//!     &BusinessTransactionDefinition::new(1, "checkout"),
//!     "checkout",
//! );
//!
//! assert_eq!(registry.business_transactions_for(app.id()), vec![tx]);
//! ```

#![warn(missing_docs)]

pub mod data;
pub mod definition;
pub mod id;
pub mod registry;

// Re-exports
pub use data::{ApplicationData, BusinessTransactionData};
pub use definition::{ApplicationDefinition, BusinessTransactionDefinition};
pub use id::{derive_instance_id, string_hash, DefinitionId, InstanceId, DEFAULT_INSTANCE_ID};
pub use registry::{BusinessContextRegistry, BusinessTransactionKey};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
