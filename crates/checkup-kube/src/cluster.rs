use async_trait::async_trait;
use k8s_openapi::api::{
    batch::v1::Job,
    core::v1::{ConfigMap, Namespace, Pod, ServiceAccount},
    rbac::v1::{ClusterRoleBinding, Role, RoleBinding},
};
use kube::{
    Api, Client,
    api::{DeleteParams, ListParams, LogParams, PostParams},
};
use tracing::debug;

use checkup_core::cluster::{ClusterApi, ClusterError, ClusterResult, JobWatch};

use crate::{error::classify, watch::job_watch};

fn name_of(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> &str {
    meta.name.as_deref().unwrap_or_default()
}

/// Cluster access through a `kube` client.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the in-cluster environment or the local kubeconfig.
    pub async fn try_default() -> ClusterResult<Self> {
        Client::try_default()
            .await
            .map(Self::new)
            .map_err(|e| ClusterError::Transport(e.to_string()))
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn cluster_wide<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::ClusterResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn create_namespace(&self, namespace: &Namespace) -> ClusterResult<Namespace> {
        self.cluster_wide::<Namespace>()
            .create(&PostParams::default(), namespace)
            .await
            .map_err(|e| classify(e, "Namespace", name_of(&namespace.metadata)))
    }

    async fn create_service_account(
        &self,
        namespace: &str,
        account: &ServiceAccount,
    ) -> ClusterResult<ServiceAccount> {
        self.namespaced::<ServiceAccount>(namespace)
            .create(&PostParams::default(), account)
            .await
            .map_err(|e| classify(e, "ServiceAccount", name_of(&account.metadata)))
    }

    async fn create_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap> {
        self.namespaced::<ConfigMap>(namespace)
            .create(&PostParams::default(), map)
            .await
            .map_err(|e| classify(e, "ConfigMap", name_of(&map.metadata)))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> ClusterResult<ConfigMap> {
        self.namespaced::<ConfigMap>(namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, "ConfigMap", name))
    }

    async fn replace_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap> {
        let name = name_of(&map.metadata);
        self.namespaced::<ConfigMap>(namespace)
            .replace(name, &PostParams::default(), map)
            .await
            .map_err(|e| classify(e, "ConfigMap", name))
    }

    async fn create_role(&self, namespace: &str, role: &Role) -> ClusterResult<Role> {
        self.namespaced::<Role>(namespace)
            .create(&PostParams::default(), role)
            .await
            .map_err(|e| classify(e, "Role", name_of(&role.metadata)))
    }

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> ClusterResult<RoleBinding> {
        self.namespaced::<RoleBinding>(namespace)
            .create(&PostParams::default(), binding)
            .await
            .map_err(|e| classify(e, "RoleBinding", name_of(&binding.metadata)))
    }

    async fn create_cluster_role_binding(
        &self,
        binding: &ClusterRoleBinding,
    ) -> ClusterResult<ClusterRoleBinding> {
        self.cluster_wide::<ClusterRoleBinding>()
            .create(&PostParams::default(), binding)
            .await
            .map_err(|e| classify(e, "ClusterRoleBinding", name_of(&binding.metadata)))
    }

    async fn create_job(&self, namespace: &str, job: &Job) -> ClusterResult<Job> {
        self.namespaced::<Job>(namespace)
            .create(&PostParams::default(), job)
            .await
            .map_err(|e| classify(e, "Job", name_of(&job.metadata)))
    }

    async fn watch_jobs(&self, namespace: &str, label_selector: &str) -> ClusterResult<JobWatch> {
        debug!(namespace, label_selector, "watching jobs");
        Ok(job_watch(self.namespaced::<Job>(namespace), label_selector))
    }

    async fn pod_logs(&self, namespace: &str, label_selector: &str) -> ClusterResult<String> {
        let pods = self.namespaced::<Pod>(namespace);
        let list = pods
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| classify(e, "Pod", label_selector))?;
        let first = list
            .items
            .first()
            .and_then(|p| p.metadata.name.clone())
            .ok_or_else(|| ClusterError::not_found("Pod", label_selector))?;

        pods.logs(&first, &LogParams::default())
            .await
            .map_err(|e| classify(e, "Pod", &first))
    }

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()> {
        self.cluster_wide::<Namespace>()
            .delete(name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| classify(e, "Namespace", name))
    }

    async fn delete_cluster_role_binding(&self, name: &str) -> ClusterResult<()> {
        self.cluster_wide::<ClusterRoleBinding>()
            .delete(name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| classify(e, "ClusterRoleBinding", name))
    }
}
