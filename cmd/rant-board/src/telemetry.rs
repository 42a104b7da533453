//! Tracing subscriber setup. Logs go to stderr so rendered HTML on stdout
//! stays clean.

use configs::{LogFormat, LoggingSettings};
use tracing::Dispatch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used before settings are known.
const BOOTSTRAP_LEVEL: &str = "warn";

/// Scoped subscriber for the settings load itself, so events raised while
/// reading `.env` and config files reach stderr. `RUST_LOG` applies here too.
pub fn bootstrap() -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_LEVEL));
    Dispatch::new(
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr)),
    )
}

/// `RUST_LOG` wins over `logging.level`.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };
    let registry = tracing_subscriber::registry().with(filter);

    match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
