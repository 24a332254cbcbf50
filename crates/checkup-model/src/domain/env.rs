use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Ordered list of environment variables for the checkup container.
///
/// Serialized as a transparent array wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(pub Vec<KeyValue>);

impl Env {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append a variable. Later entries override earlier ones when queried via [`Env::get`].
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }
}

/// Normalise an arbitrary parameter name into an environment-variable-safe name.
///
/// Letters are upper-cased; anything outside `[A-Z0-9_]` becomes `_`.
pub fn env_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Env, env_safe_name};

    #[test]
    fn push_and_override_last_wins() {
        let mut env = Env::new();
        env.push("FOO", "one");
        env.push("BAR", "x");
        env.push("FOO", "two");

        assert_eq!(env.len(), 3);
        assert_eq!(env.get("FOO"), Some("two"));
        assert_eq!(env.get("BAR"), Some("x"));
        assert!(env.get("BAZ").is_none());
    }

    #[test]
    fn env_safe_name_uppercases_and_replaces() {
        assert_eq!(env_safe_name("nad_name"), "NAD_NAME");
        assert_eq!(env_safe_name("sample-duration.seconds"), "SAMPLE_DURATION_SECONDS");
        assert_eq!(env_safe_name("MAX9"), "MAX9");
        assert_eq!(env_safe_name("héllo"), "H_LLO");
    }

    #[test]
    fn serde_is_transparent_array() {
        let mut env = Env::new();
        env.push("FOO", "bar");

        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"[{"key":"FOO","value":"bar"}]"#);
    }
}
