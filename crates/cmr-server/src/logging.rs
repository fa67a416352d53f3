//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ServerConfigError;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the configured filter. Output goes to
/// stderr so reports on stdout stay machine readable.
///
/// # Errors
/// Returns [`ServerConfigError::Logging`] if the filter is invalid or a
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ServerConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| ServerConfigError::Logging(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ServerConfigError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            filter: "cmr_server=notalevel".to_string(),
            format: LogFormat::Pretty,
        };
        assert!(matches!(init(&config), Err(ServerConfigError::Logging(_))));
    }
}
