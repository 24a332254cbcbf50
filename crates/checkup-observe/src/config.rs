use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{
    error::{LoggerError, LoggerResult},
    object::{LoggerFormat, LoggerLevel, LoggerTimeZone},
};

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const LOG_TZ_ENV: &str = "LOG_TZ";
pub const LOG_COLOR_ENV: &str = "LOG_COLOR";

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives.
    pub level: LoggerLevel,
    pub tz: LoggerTimeZone,
    /// Include the event target (module path) in each line.
    pub with_targets: bool,
    /// Colorize text output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Build from environment-like lookups of `LOG_FORMAT`, `LOG_LEVEL`, `LOG_TZ` and `LOG_COLOR`.
    ///
    /// Unset or empty variables keep their defaults.
    ///
    /// ```rust
    /// use checkup_observe::{LoggerConfig, LoggerFormat};
    ///
    /// let cfg = LoggerConfig::from_lookup(|key| (key == "LOG_FORMAT").then(|| "json".to_string())).unwrap();
    /// assert_eq!(cfg.format, LoggerFormat::Json);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> LoggerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get(LOG_FORMAT_ENV) {
            cfg.format = v.parse()?;
        }
        if let Some(v) = get(LOG_LEVEL_ENV) {
            cfg.level = v.parse()?;
        }
        if let Some(v) = get(LOG_TZ_ENV) {
            cfg.tz = v.parse()?;
        }
        if let Some(v) = get(LOG_COLOR_ENV) {
            cfg.use_color = match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(LoggerError::InvalidFlag {
                        var: LOG_COLOR_ENV,
                        value: v,
                    });
                }
            };
        }
        Ok(cfg)
    }

    pub fn from_env() -> LoggerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Whether text output is colorized: requested and stdout is a terminal.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
