use std::collections::BTreeMap;

use crate::{ConfigData, domain::keys, error::ModelError};

/// Location of the results object, as handed to the workload through its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadTarget {
    /// Namespace of the results ConfigMap.
    pub namespace: String,
    /// Name of the results ConfigMap.
    pub name: String,
}

impl WorkloadTarget {
    /// Resolve the results object from environment-like lookups.
    ///
    /// ```rust
    /// use checkup_model::WorkloadTarget;
    ///
    /// let target = WorkloadTarget::from_lookup(|key| match key {
    ///     "RESULT_CONFIGMAP_NAME" => Some("checkup-results".into()),
    ///     "RESULT_CONFIGMAP_NAMESPACE" => Some("checkup-workspace-1a2b3c4d".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(target.name, "checkup-results");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ModelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace =
            lookup(keys::RESULTS_NAMESPACE_ENV).ok_or(ModelError::MissingEnv(keys::RESULTS_NAMESPACE_ENV))?;
        let name = lookup(keys::RESULTS_NAME_ENV).ok_or(ModelError::MissingEnv(keys::RESULTS_NAME_ENV))?;
        Ok(Self { namespace, name })
    }

    /// Resolve the results object from the process environment.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Report a workload publishes into its results object.
///
/// Built explicitly from an outcome, then flattened with [`WorkloadReport::into_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadReport {
    succeeded: bool,
    failure_reason: String,
    results: BTreeMap<String, String>,
}

impl WorkloadReport {
    /// Report of a successful run.
    pub fn succeeded() -> Self {
        Self {
            succeeded: true,
            failure_reason: String::new(),
            results: BTreeMap::new(),
        }
    }

    /// Report of a failed run with its reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            failure_reason: reason.into(),
            results: BTreeMap::new(),
        }
    }

    /// Add one metric under `status.result.<name>`.
    pub fn with_result(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.results.insert(name.into(), value.into());
        self
    }

    /// Add several metrics at once.
    pub fn with_results<I, K, V>(mut self, results: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.results
            .extend(results.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Flatten into results ConfigMap data.
    pub fn into_data(self) -> ConfigData {
        let mut data = ConfigData::new();
        data.insert(keys::STATUS_SUCCEEDED_KEY, self.succeeded.to_string())
            .insert(keys::STATUS_FAILURE_REASON_KEY, self.failure_reason);
        for (name, value) in self.results {
            data.insert(format!("{}{name}", keys::STATUS_RESULT_PREFIX), value);
        }
        data
    }
}
