//! Process-wide `tracing` subscriber for the checkup launcher.
mod config;
pub use config::{LOG_COLOR_ENV, LOG_FORMAT_ENV, LOG_LEVEL_ENV, LOG_TZ_ENV, LoggerConfig};

mod error;
pub use error::{LoggerError, LoggerResult};

mod object;
pub use object::{LoggerFormat, LoggerLevel, LoggerRfc3339, LoggerTimeZone};

mod init;

/// Install the global subscriber described by `cfg`.
///
/// With [`LoggerTimeZone::Local`], call this before starting a multi-threaded runtime,
/// otherwise the local offset cannot be detected and timestamps fall back to UTC.
///
/// ```rust
/// use checkup_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).unwrap();
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => init::logger_text(cfg),
        LoggerFormat::Json => init::logger_json(cfg),
        LoggerFormat::Journald => init::logger_journald(cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        let cfg = LoggerConfig {
            use_color: false,
            ..Default::default()
        };
        let first = init_logger(&cfg);
        let second = init_logger(&cfg);

        assert!(first.is_ok() || matches!(first, Err(LoggerError::AlreadyInitialized)));
        assert!(matches!(second, Err(LoggerError::AlreadyInitialized)));
    }
}
