//! Shape detection for CNI network configuration blobs.
//!
//! A network attachment carries either a single plugin config or a plugin chain
//! (`conflist`). Checkups that need to know which plugins back a network parse the
//! blob into [`CniConfig`] and flatten it with [`CniConfig::plugin_types`].
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

const PLUGINS_FIELD: &str = "plugins";

/// Plugin layout of one CNI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CniConfig {
    /// Plain config with a top-level `type`.
    SinglePlugin { plugin_type: String },
    /// `conflist` with a non-empty `plugins` array.
    PluginChain { plugin_types: Vec<String> },
}

#[derive(Deserialize)]
struct PluginEntry {
    #[serde(rename = "type")]
    plugin_type: String,
}

impl CniConfig {
    /// Detect the layout of a raw JSON config.
    pub fn parse(raw: &str) -> ModelResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ModelError::InvalidCniConfig(format!("malformed JSON: {e}")))?;
        if !value.is_object() {
            return Err(ModelError::InvalidCniConfig("expected a JSON object".into()));
        }

        match value.get(PLUGINS_FIELD) {
            Some(plugins) => {
                let entries = Vec::<PluginEntry>::deserialize(plugins).map_err(|e| {
                    ModelError::InvalidCniConfig(format!("invalid plugin chain: {e}"))
                })?;
                if entries.is_empty() {
                    return Err(ModelError::InvalidCniConfig("plugin chain is empty".into()));
                }
                Ok(CniConfig::PluginChain {
                    plugin_types: entries.into_iter().map(|p| p.plugin_type).collect(),
                })
            }
            None => {
                let entry = PluginEntry::deserialize(&value).map_err(|e| {
                    ModelError::InvalidCniConfig(format!("invalid single plugin config: {e}"))
                })?;
                Ok(CniConfig::SinglePlugin {
                    plugin_type: entry.plugin_type,
                })
            }
        }
    }

    /// Plugin type names in chain order.
    pub fn plugin_types(&self) -> Vec<&str> {
        match self {
            CniConfig::SinglePlugin { plugin_type } => vec![plugin_type.as_str()],
            CniConfig::PluginChain { plugin_types } => {
                plugin_types.iter().map(String::as_str).collect()
            }
        }
    }
}
