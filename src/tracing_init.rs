use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Level, Logger, Result};

impl<'a> MakeWriter<'a> for Logger {
    type Writer = &'a Logger;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

/// A `tracing-subscriber` fmt layer that writes events through `logger`,
/// sharing its sinks and rotation.
pub fn fmt_layer<S>(logger: Logger) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(logger)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
}

/// Route `tracing` events into `logger` with an optional CLI verbosity
/// override.
pub fn init_logging(logger: &Logger, cli_verbose: Option<u8>) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let log_spec = log_spec(logger.level(), cli_verbose, rust_log.as_deref());

    let env_filter = EnvFilter::try_new(&log_spec).map_err(|e| Error::Init(e.to_string()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(logger.clone()))
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

fn filter_name(level: Level) -> &'static str {
    match level {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error | Level::Fatal | Level::Alert => "error",
    }
}

/// Determine the filter specification from RUST_LOG, CLI verbosity and the
/// logger threshold, in that order of precedence.
fn log_spec(level: Level, cli_verbose: Option<u8>, rust_log: Option<&str>) -> String {
    if let Some(rust_log) = rust_log
        && !rust_log.is_empty()
    {
        return rust_log.to_string();
    }

    match cli_verbose {
        None | Some(0) => filter_name(level).to_string(),
        Some(1) => "debug".to_string(),
        Some(_) => "trace".to_string(),
    }
}
