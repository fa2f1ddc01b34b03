//! Logging system setup.

use crate::config::LoggingSettings;
use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn setup_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_thread_ids(true))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(true))
            .try_init()?;
    }

    tracing::info!("🔧 Logging initialized with level: {}", settings.level);
    Ok(())
}
