use thiserror::Error;

use checkup_core::workspace::DEFAULT_WORKSPACE_PREFIX;
use checkup_observe::{LoggerConfig, LoggerError};

pub const CONFIGMAP_NAMESPACE_ENV: &str = "CONFIGMAP_NAMESPACE";
pub const CONFIGMAP_NAME_ENV: &str = "CONFIGMAP_NAME";
pub const WORKSPACE_PREFIX_ENV: &str = "CHECKUP_WORKSPACE_PREFIX";

/// Room left in a 63 character namespace name for `-` and the 8 character suffix.
const MAX_PREFIX_LEN: usize = 54;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid CHECKUP_WORKSPACE_PREFIX {0:?}: must be at most 54 lowercase alphanumerics or '-', starting with a letter")]
    InvalidPrefix(String),

    #[error(transparent)]
    Logger(#[from] LoggerError),
}

/// Process configuration of one launcher run.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Namespace of the checkup ConfigMap.
    pub spec_namespace: String,
    pub spec_name: String,
    pub workspace_prefix: String,
    pub logger: LoggerConfig,
}

impl LauncherConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let spec_namespace = required(CONFIGMAP_NAMESPACE_ENV)?;
        let spec_name = required(CONFIGMAP_NAME_ENV)?;

        let workspace_prefix = lookup(WORKSPACE_PREFIX_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKSPACE_PREFIX.to_string());
        if !valid_prefix(&workspace_prefix) {
            return Err(ConfigError::InvalidPrefix(workspace_prefix));
        }

        Ok(Self {
            spec_namespace,
            spec_name,
            workspace_prefix,
            logger: LoggerConfig::from_lookup(&lookup)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn valid_prefix(prefix: &str) -> bool {
    prefix.len() <= MAX_PREFIX_LEN
        && prefix.starts_with(|c: char| c.is_ascii_lowercase())
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use checkup_observe::LoggerFormat;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn reads_spec_location_and_defaults() {
        let cfg = LauncherConfig::from_lookup(lookup(&[
            ("CONFIGMAP_NAMESPACE", "default"),
            ("CONFIGMAP_NAME", "latency-checkup"),
        ]))
        .unwrap();

        assert_eq!(cfg.spec_namespace, "default");
        assert_eq!(cfg.spec_name, "latency-checkup");
        assert_eq!(cfg.workspace_prefix, "checkup-workspace");
        assert_eq!(cfg.logger.format, LoggerFormat::Text);
    }

    #[test]
    fn missing_variables_are_named() {
        let err = LauncherConfig::from_lookup(lookup(&[("CONFIGMAP_NAMESPACE", "default")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CONFIGMAP_NAME")));

        let err = LauncherConfig::from_lookup(lookup(&[
            ("CONFIGMAP_NAMESPACE", " "),
            ("CONFIGMAP_NAME", "c"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CONFIGMAP_NAMESPACE")));
    }

    #[test]
    fn custom_prefix_and_logger() {
        let cfg = LauncherConfig::from_lookup(lookup(&[
            ("CONFIGMAP_NAMESPACE", "default"),
            ("CONFIGMAP_NAME", "c"),
            ("CHECKUP_WORKSPACE_PREFIX", "latency"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(cfg.workspace_prefix, "latency");
        assert_eq!(cfg.logger.format, LoggerFormat::Json);
    }

    #[test]
    fn rejects_prefixes_that_cannot_name_a_namespace() {
        let long = "a".repeat(55);
        for prefix in ["Checkup", "1abc", "with_underscore", long.as_str()] {
            let err = LauncherConfig::from_lookup(lookup(&[
                ("CONFIGMAP_NAMESPACE", "default"),
                ("CONFIGMAP_NAME", "c"),
                ("CHECKUP_WORKSPACE_PREFIX", prefix),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidPrefix(_)), "{prefix}");
        }
    }

    #[test]
    fn logger_errors_propagate() {
        let err = LauncherConfig::from_lookup(lookup(&[
            ("CONFIGMAP_NAMESPACE", "default"),
            ("CONFIGMAP_NAME", "c"),
            ("LOG_LEVEL", "checkup_core=loud"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Logger(LoggerError::InvalidLevel(_))));
    }
}
