//! Logging setup for the binary.

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

pub use tracing_subscriber::util::TryInitError;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .try_init()?,
        LogFormat::Pretty => subscriber
            .with(fmt::layer().pretty().with_target(true))
            .try_init()?,
        LogFormat::Compact => subscriber
            .with(fmt::layer().compact().with_target(false))
            .try_init()?,
    }

    info!(
        level = %config.level,
        format = ?config.format,
        "logging initialized"
    );
    Ok(())
}
