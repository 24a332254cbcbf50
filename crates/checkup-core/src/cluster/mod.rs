//! Seam between the orchestration engine and the cluster API.
//!
//! The engine only ever talks to the cluster through [`ClusterApi`]; the kube-backed
//! implementation lives in `checkup-kube`, tests use an in-memory fake.
mod error;
pub use error::ClusterError;

mod watch;
pub use watch::{ClusterEvent, JobWatch};

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use k8s_openapi::api::{
    batch::v1::Job,
    core::v1::{ConfigMap, Namespace, ServiceAccount},
    rbac::v1::{ClusterRoleBinding, Role, RoleBinding},
};

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Cluster operations needed to run one checkup.
///
/// Every call is a single attempt: implementations never retry, errors propagate to the caller.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_namespace(&self, namespace: &Namespace) -> ClusterResult<Namespace>;

    async fn create_service_account(
        &self,
        namespace: &str,
        account: &ServiceAccount,
    ) -> ClusterResult<ServiceAccount>;

    async fn create_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> ClusterResult<ConfigMap>;

    /// Replace a ConfigMap with the given object (optimistic concurrency via its resourceVersion).
    async fn replace_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap>;

    async fn create_role(&self, namespace: &str, role: &Role) -> ClusterResult<Role>;

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> ClusterResult<RoleBinding>;

    async fn create_cluster_role_binding(
        &self,
        binding: &ClusterRoleBinding,
    ) -> ClusterResult<ClusterRoleBinding>;

    async fn create_job(&self, namespace: &str, job: &Job) -> ClusterResult<Job>;

    /// Subscribe to job events in `namespace` matching `label_selector` (e.g. `job-name=checkup-job`).
    async fn watch_jobs(&self, namespace: &str, label_selector: &str) -> ClusterResult<JobWatch>;

    /// Logs of the first pod matching `label_selector` in `namespace`.
    async fn pod_logs(&self, namespace: &str, label_selector: &str) -> ClusterResult<String>;

    /// Delete a namespace; removal of everything inside it cascades.
    async fn delete_namespace(&self, name: &str) -> ClusterResult<()>;

    async fn delete_cluster_role_binding(&self, name: &str) -> ClusterResult<()>;
}
