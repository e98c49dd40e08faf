use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, ErrorDetails};

/// Log output format for all gateway logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Set up logging for the gateway.
///
/// The filter defaults to `info` for external crates and `debug` for our own,
/// and can be overridden with `RUST_LOG`.
pub fn setup_observability(log_format: LogFormat) -> Result<(), Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gateway=info,pricegate_internal=info"));

    let result = match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| {
        Error::new(ErrorDetails::Config {
            message: format!("Failed to initialize tracing subscriber: {e}"),
        })
    })
}
