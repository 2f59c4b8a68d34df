//! Tracing subscriber setup

use crate::config::{LogConfig, LogFormat};
use crate::error::{PluginRuntimeError, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` directives take precedence; the configured level is the
/// default for everything it does not mention. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| PluginRuntimeError::config(format!("Invalid log level: {}", config.level)))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(config.with_target).with_level(true))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init(),
    };

    installed.map_err(PluginRuntimeError::tracing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level() {
        let config = LogConfig {
            level: "loud".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_tracing(&config),
            Err(PluginRuntimeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(
            init_tracing(&config),
            Err(PluginRuntimeError::TracingError(_))
        ));
    }
}
