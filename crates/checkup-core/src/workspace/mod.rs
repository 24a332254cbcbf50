//! In-memory model of the checkup sandbox.
//!
//! A [`Workspace`] is built before any cluster call. The provisioner records every
//! resource it creates into it, so teardown always knows exactly what to release,
//! including after a partially failed setup.
pub mod objects;

use std::{collections::BTreeSet, time::Duration};

use k8s_openapi::api::batch::v1::Job;
use uuid::Uuid;

use checkup_model::{CheckupSpec, Env, keys};

pub const DEFAULT_WORKSPACE_PREFIX: &str = "checkup-workspace";
pub const SERVICE_ACCOUNT_NAME: &str = "checkup-sa";
pub const RESULTS_CONFIG_MAP_NAME: &str = "checkup-results";
pub const RESULTS_WRITER_ROLE_NAME: &str = "results-configmap-writer";
pub const JOB_NAME: &str = "checkup-job";
pub const REQUESTED_ROLE_BINDING_PREFIX: &str = "checkup-role-";
/// Label key identifying the job (and its pods) by name.
pub const JOB_NAME_LABEL: &str = "job-name";

/// Names of every object of one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceNames {
    namespace: String,
}

impl WorkspaceNames {
    /// Fresh names under `prefix`, unique per launcher run.
    pub fn generate(prefix: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            namespace: format!("{prefix}-{}", &id[..8]),
        }
    }

    /// Names rooted at an explicit namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Sandbox namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Service account the job runs as.
    pub fn service_account(&self) -> &str {
        SERVICE_ACCOUNT_NAME
    }

    /// ConfigMap the workload writes its results into.
    pub fn results_config_map(&self) -> &str {
        RESULTS_CONFIG_MAP_NAME
    }

    /// Role allowing updates of the results ConfigMap only.
    pub fn results_writer_role(&self) -> &str {
        RESULTS_WRITER_ROLE_NAME
    }

    /// Name of the checkup job.
    pub fn job(&self) -> &str {
        JOB_NAME
    }

    /// Label selector matching only this workspace's job and its pods.
    pub fn job_selector(&self) -> String {
        format!("{JOB_NAME_LABEL}={JOB_NAME}")
    }

    /// Namespaced binding name for the workspace's own `role`.
    pub fn role_binding(&self, role: &str) -> String {
        format!("{role}-to-sa")
    }

    /// Namespaced binding name for a requested permission. Never equal to a
    /// [`role_binding`](Self::role_binding) name, whatever the permission is called.
    pub fn requested_role_binding(&self, role: &str) -> String {
        format!("{REQUESTED_ROLE_BINDING_PREFIX}{role}")
    }

    /// Cluster-wide binding name for `cluster_role`; carries the namespace to stay unique across runs.
    pub fn cluster_role_binding(&self, cluster_role: &str) -> String {
        format!("{}-{cluster_role}", self.namespace)
    }
}

/// Resources created so far, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedResources {
    /// The sandbox namespace exists. Deleting it releases every namespaced object below.
    pub namespace: bool,
    /// The workload's service account was created.
    pub service_account: bool,
    /// The empty results ConfigMap was created.
    pub results_config_map: bool,
    /// Namespaced Roles, by name.
    pub roles: Vec<String>,
    /// Namespaced RoleBindings, by name.
    pub role_bindings: Vec<String>,
    /// ClusterRoleBindings, by name. Cluster scoped, so teardown deletes each one.
    pub cluster_role_bindings: Vec<String>,
}

/// Ephemeral sandbox of one launcher run.
#[derive(Debug, Clone)]
pub struct Workspace {
    names: WorkspaceNames,
    image: String,
    timeout: Duration,
    env: Env,
    cluster_roles: BTreeSet<String>,
    roles: BTreeSet<String>,
    created: CreatedResources,
    job: Option<Job>,
}

impl Workspace {
    /// Lay out a workspace for `spec`. No cluster call is made.
    pub fn new(spec: &CheckupSpec, names: WorkspaceNames) -> Self {
        let mut env = spec.param_env();
        env.push(keys::RESULTS_NAME_ENV, names.results_config_map());
        env.push(keys::RESULTS_NAMESPACE_ENV, names.namespace());

        Self {
            image: spec.image().to_string(),
            timeout: spec.timeout(),
            cluster_roles: spec.cluster_roles().clone(),
            roles: spec.roles().clone(),
            created: CreatedResources::default(),
            job: None,
            env,
            names,
        }
    }

    pub fn names(&self) -> &WorkspaceNames {
        &self.names
    }

    pub fn namespace(&self) -> &str {
        self.names.namespace()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full workload environment: parameters plus the results-object location.
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn cluster_roles(&self) -> &BTreeSet<String> {
        &self.cluster_roles
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn created(&self) -> &CreatedResources {
        &self.created
    }

    pub(crate) fn created_mut(&mut self) -> &mut CreatedResources {
        &mut self.created
    }

    /// Whether anything exists in the cluster that teardown must release.
    pub fn needs_teardown(&self) -> bool {
        self.created.namespace || !self.created.cluster_role_bindings.is_empty()
    }

    /// Job object to submit for this workspace.
    pub fn job_template(&self) -> Job {
        objects::checkup_job(
            self.names.job(),
            self.names.namespace(),
            JOB_NAME_LABEL,
            &self.image,
            &self.env,
            self.names.service_account(),
        )
    }

    /// Last observed state of the launched job, if it was launched.
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub(crate) fn set_job(&mut self, job: Job) {
        self.job = Some(job);
    }
}
