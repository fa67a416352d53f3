//! CMR Server
//!
//! Composition root for the instrumentation control plane: reads the server
//! configuration, installs logging, and owns the registry and scheduler.
//!
//! # Example
//!
//! ```rust
//! use cmr_server::{ControlPlane, ServerConfig};
//!
//! let config = ServerConfig::from_toml_str("").unwrap();
//! let plane = ControlPlane::from_config(&config);
//! let report = plane.bootstrap(&config).unwrap();
//! assert!(report.agents.is_empty());
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod control_plane;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{AgentEntry, ClassEntry, LogFormat, LoggingConfig, ServerConfig};
pub use control_plane::{AgentReport, ApplicationSummary, ControlPlane, RunReport};
pub use error::{ControlPlaneError, ServerConfigError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
