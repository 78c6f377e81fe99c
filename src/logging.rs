//! Tracing subscriber setup
//!
//! Console output is pretty or JSON depending on `logging.format`. When
//! `logging.directory` is set, the same events also go to a daily-rolling
//! file through a non-blocking writer.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Prefix of the rolling log files
pub const LOG_FILE_PREFIX: &str = "registre.log";

/// Default filter directives when `RUST_LOG` is unset
pub fn default_directives(level: &str) -> String {
    format!("registre_server={},tower_http=debug", level)
}

fn format_layer<W>(json: bool, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed()
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept
/// alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let json = config.format.eq_ignore_ascii_case("json");
    let mut layers = vec![format_layer(json, std::io::stdout, true)];

    let guard = config.directory.as_ref().map(|directory| {
        let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(json, writer, false));
        guard
    });

    // Ignore the error if a subscriber is already set
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    guard
}
