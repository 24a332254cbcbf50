//! In-memory [`ClusterApi`] used by the engine's tests.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Mutex,
};

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use k8s_openapi::{
    api::{
        batch::v1::{Job, JobCondition, JobStatus},
        core::v1::{ConfigMap, Namespace, ServiceAccount},
        rbac::v1::{ClusterRoleBinding, Role, RoleBinding},
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};

use checkup_model::{CheckupSpec, ConfigData};

use super::{ClusterApi, ClusterError, ClusterEvent, ClusterResult, JobWatch};

#[derive(Default)]
struct State {
    calls: Vec<String>,
    failures: HashMap<String, ClusterError>,
    namespaces: BTreeSet<String>,
    cluster_role_bindings: BTreeSet<String>,
    role_bindings: BTreeSet<(String, String)>,
    config_maps: BTreeMap<(String, String), ConfigMap>,
    jobs: Vec<Job>,
    queued_events: Vec<ClusterEvent>,
    close_after_queued: bool,
    workload_results: Option<ConfigData>,
    watch_tx: Option<UnboundedSender<ClusterEvent>>,
    logs: Option<String>,
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    state: Mutex<State>,
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Fail every call of `op`.
    pub(crate) fn fail(&self, op: &str, err: ClusterError) {
        self.lock().failures.insert(op.to_string(), err);
    }

    /// Fail `op` only when it targets `name`.
    pub(crate) fn fail_on(&self, op: &str, name: &str, err: ClusterError) {
        self.lock().failures.insert(format!("{op}:{name}"), err);
    }

    /// Event delivered as soon as a watch is opened.
    pub(crate) fn queue_event(&self, event: ClusterEvent) {
        self.lock().queued_events.push(event);
    }

    /// End the watch stream right after the queued events.
    pub(crate) fn close_watch_after_queued(&self) {
        self.lock().close_after_queued = true;
    }

    /// Data the simulated workload writes into its results object when the job is created.
    pub(crate) fn workload_writes(&self, data: ConfigData) {
        self.lock().workload_results = Some(data);
    }

    pub(crate) fn set_logs(&self, logs: &str) {
        self.lock().logs = Some(logs.to_string());
    }

    pub(crate) fn insert_config_map(&self, namespace: &str, map: ConfigMap) {
        let key = (namespace.to_string(), name_of(&map.metadata));
        self.lock().config_maps.insert(key, map);
    }

    pub(crate) fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.lock()
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Simulate someone else deleting the namespace.
    pub(crate) fn delete_namespace_externally(&self, name: &str) {
        let mut st = self.lock();
        st.namespaces.remove(name);
        st.config_maps.retain(|(ns, _), _| ns != name);
        st.role_bindings.retain(|(ns, _)| ns != name);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of `op`.
    pub(crate) fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub(crate) fn jobs(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    pub(crate) fn cluster_role_bindings(&self) -> BTreeSet<String> {
        self.lock().cluster_role_bindings.clone()
    }

    /// RoleBinding names created in `namespace`.
    pub(crate) fn role_bindings(&self, namespace: &str) -> BTreeSet<String> {
        self.lock()
            .role_bindings
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub(crate) fn namespaces(&self) -> BTreeSet<String> {
        self.lock().namespaces.clone()
    }

    /// Sender feeding the currently open watch, if one was opened.
    pub(crate) fn watch_sender(&self) -> Option<UnboundedSender<ClusterEvent>> {
        self.lock().watch_tx.clone()
    }

    fn record(&self, op: &str, name: &str) -> ClusterResult<()> {
        let mut st = self.lock();
        st.calls.push(format!("{op}:{name}"));
        if let Some(err) = st.failures.get(&format!("{op}:{name}")) {
            return Err(err.clone());
        }
        match st.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn create_namespace(&self, namespace: &Namespace) -> ClusterResult<Namespace> {
        let name = name_of(&namespace.metadata);
        self.record("create_namespace", &name)?;
        self.lock().namespaces.insert(name);
        Ok(namespace.clone())
    }

    async fn create_service_account(
        &self,
        namespace: &str,
        account: &ServiceAccount,
    ) -> ClusterResult<ServiceAccount> {
        self.record("create_service_account", &name_of(&account.metadata))?;
        if !self.lock().namespaces.contains(namespace) {
            return Err(ClusterError::not_found("Namespace", namespace));
        }
        Ok(account.clone())
    }

    async fn create_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap> {
        self.record("create_config_map", &name_of(&map.metadata))?;
        self.insert_config_map(namespace, map.clone());
        Ok(map.clone())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> ClusterResult<ConfigMap> {
        self.record("get_config_map", name)?;
        self.config_map(namespace, name)
            .ok_or_else(|| ClusterError::not_found("ConfigMap", name))
    }

    async fn replace_config_map(&self, namespace: &str, map: &ConfigMap) -> ClusterResult<ConfigMap> {
        self.record("replace_config_map", &name_of(&map.metadata))?;
        self.insert_config_map(namespace, map.clone());
        Ok(map.clone())
    }

    async fn create_role(&self, _namespace: &str, role: &Role) -> ClusterResult<Role> {
        self.record("create_role", &name_of(&role.metadata))?;
        Ok(role.clone())
    }

    async fn create_role_binding(
        &self,
        namespace: &str,
        binding: &RoleBinding,
    ) -> ClusterResult<RoleBinding> {
        let name = name_of(&binding.metadata);
        self.record("create_role_binding", &name)?;
        if !self.lock().role_bindings.insert((namespace.to_string(), name.clone())) {
            return Err(ClusterError::AlreadyExists {
                kind: "RoleBinding",
                name,
            });
        }
        Ok(binding.clone())
    }

    async fn create_cluster_role_binding(
        &self,
        binding: &ClusterRoleBinding,
    ) -> ClusterResult<ClusterRoleBinding> {
        let name = name_of(&binding.metadata);
        self.record("create_cluster_role_binding", &name)?;
        self.lock().cluster_role_bindings.insert(name);
        Ok(binding.clone())
    }

    async fn create_job(&self, namespace: &str, job: &Job) -> ClusterResult<Job> {
        self.record("create_job", &name_of(&job.metadata))?;
        let mut st = self.lock();
        st.jobs.push(job.clone());
        if let Some(results) = st.workload_results.clone() {
            let key = (namespace.to_string(), crate::workspace::RESULTS_CONFIG_MAP_NAME.to_string());
            if let Some(map) = st.config_maps.get_mut(&key) {
                let data = map.data.get_or_insert_with(BTreeMap::new);
                data.extend(results.into_inner());
            }
        }
        Ok(job.clone())
    }

    async fn watch_jobs(&self, _namespace: &str, label_selector: &str) -> ClusterResult<JobWatch> {
        self.record("watch_jobs", label_selector)?;
        let (tx, rx) = mpsc::unbounded();
        let mut st = self.lock();
        for event in st.queued_events.drain(..) {
            let _ = tx.unbounded_send(event);
        }
        if st.close_after_queued {
            tx.close_channel();
        }
        st.watch_tx = Some(tx);
        Ok(JobWatch::new(rx))
    }

    async fn pod_logs(&self, _namespace: &str, label_selector: &str) -> ClusterResult<String> {
        self.record("pod_logs", label_selector)?;
        self.lock()
            .logs
            .clone()
            .ok_or_else(|| ClusterError::not_found("Pod", label_selector))
    }

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()> {
        self.record("delete_namespace", name)?;
        let mut st = self.lock();
        if !st.namespaces.remove(name) {
            return Err(ClusterError::not_found("Namespace", name));
        }
        st.config_maps.retain(|(ns, _), _| ns != name);
        st.role_bindings.retain(|(ns, _)| ns != name);
        Ok(())
    }

    async fn delete_cluster_role_binding(&self, name: &str) -> ClusterResult<()> {
        self.record("delete_cluster_role_binding", name)?;
        if !self.lock().cluster_role_bindings.remove(name) {
            return Err(ClusterError::not_found("ClusterRoleBinding", name));
        }
        Ok(())
    }
}

/// Parse a spec from literal entries.
pub(crate) fn spec(entries: &[(&str, &str)]) -> CheckupSpec {
    let data: ConfigData = entries.iter().copied().collect();
    CheckupSpec::from_data(Some(&data)).unwrap()
}

/// Job whose status carries one condition.
pub(crate) fn job_with_condition(type_: &str, status: &str) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(crate::workspace::JOB_NAME.into()),
            ..Default::default()
        },
        status: Some(JobStatus {
            conditions: Some(vec![JobCondition {
                type_: type_.into(),
                status: status.into(),
                reason: Some(format!("{type_}Reason")),
                message: Some(format!("job is {type_}")),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Job with an empty status, as seen right after creation.
pub(crate) fn pending_job() -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(crate::workspace::JOB_NAME.into()),
            ..Default::default()
        },
        status: Some(JobStatus {
            active: Some(1),
            ..Default::default()
        }),
        ..Default::default()
    }
}
