use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use crate::{
    ConfigData, Env,
    domain::{env_safe_name, keys},
    error::{ModelError, ModelResult},
};

/// Validated checkup definition.
///
/// Built once from the raw checkup ConfigMap data via [`CheckupSpec::from_data`]; every
/// other component consumes this typed value and never looks at the raw keys again.
///
/// Fields cover:
/// - what to run (`image`) and for how long (`timeout`)
/// - workload parameters, already normalised to environment variable names
/// - pre-existing cluster and namespace permissions to grant to the workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckupSpec {
    image: String,
    timeout: Duration,
    params: BTreeMap<String, String>,
    cluster_roles: BTreeSet<String>,
    roles: BTreeSet<String>,
}

impl CheckupSpec {
    /// Parse the flat data of the checkup ConfigMap.
    ///
    /// `None` means the object has no data section at all.
    pub fn from_data(data: Option<&ConfigData>) -> ModelResult<Self> {
        let data = data.ok_or(ModelError::MissingData)?;

        let image = data
            .get(keys::SPEC_IMAGE_KEY)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ModelError::MissingField("image"))?
            .to_string();

        let raw_timeout = data
            .get(keys::SPEC_TIMEOUT_KEY)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ModelError::MissingField("timeout"))?;
        let timeout = parse_timeout(raw_timeout)?;

        let params = data
            .with_prefix(keys::SPEC_PARAM_PREFIX)
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (env_safe_name(name), value.to_string()))
            .collect();

        Ok(Self {
            image,
            timeout,
            params,
            cluster_roles: parse_newline_list(data.get(keys::SPEC_CLUSTER_ROLES_KEY)),
            roles: parse_newline_list(data.get(keys::SPEC_ROLES_KEY)),
        })
    }

    /// Container image of the workload.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Deadline for the job to reach a terminal state.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Workload parameters keyed by their environment variable name.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Names of pre-existing cluster-scoped permissions to bind cluster-wide.
    pub fn cluster_roles(&self) -> &BTreeSet<String> {
        &self.cluster_roles
    }

    /// Names of pre-existing permissions to bind inside the sandbox namespace only.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Environment derived from the parameters, one variable per parameter.
    ///
    /// The results-object variables are appended by the workspace, not here.
    pub fn param_env(&self) -> Env {
        let mut env = Env::new();
        for (name, value) in &self.params {
            env.push(name.as_str(), value.as_str());
        }
        env
    }
}

fn parse_timeout(raw: &str) -> ModelResult<Duration> {
    let timeout = humantime::parse_duration(raw).map_err(|e| ModelError::InvalidTimeout {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    if timeout.is_zero() {
        return Err(ModelError::InvalidTimeout {
            value: raw.to_string(),
            reason: "timeout must be greater than zero".into(),
        });
    }
    Ok(timeout)
}

fn parse_newline_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
