use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{MasteryConfig, DEFAULT_LOG_FILTER};

const LOG_FILE_PREFIX: &str = "mastery.log";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Installs the global subscriber for an embedding process. A subscriber that
/// is already installed wins; the call is then a no-op. Keep the returned
/// guard alive for as long as file logs should be flushed.
pub fn init_tracing(config: &MasteryConfig) -> Option<FileLogGuard> {
    let env_filter = build_env_filter(&config.log_level);
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true);

            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init();

    None
}

/// An unparsable directive string falls back to the crate default.
fn build_env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        let filter = build_env_filter("knowledge_mastery=debug");
        assert!(filter.to_string().contains("knowledge_mastery=debug"));
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        let config = MasteryConfig::default();
        let _first = init_tracing(&config);
        let _second = init_tracing(&config);
        tracing::info!("subscriber installed");
    }
}
