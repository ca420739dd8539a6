//! Tracing setup: stderr output plus an optional daily rolling log file.

use navigator_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides `logging.level`.
/// Keep the returned guard alive so buffered file output is flushed.
pub fn init(cfg: &LoggingConfig, verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { cfg.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    match cfg.directory.as_deref() {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, &cfg.file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false) // no ANSI in files
                        .with_writer(non_blocking),
                )
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
