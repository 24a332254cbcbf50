//! Builders for the cluster objects that make up a checkup workspace.
use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        batch::v1::{Job, JobSpec},
        core::v1::{
            ConfigMap, Container, EnvVar, Namespace, PodSpec, PodTemplateSpec,
            ResourceRequirements, ServiceAccount,
        },
        rbac::v1::{ClusterRoleBinding, PolicyRule, Role, RoleBinding, RoleRef, Subject},
    },
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta},
};

use checkup_model::Env;

pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";
pub const ROLE_KIND: &str = "Role";

const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
const MANAGED_BY_VALUE: &str = "checkup-launcher";

const CONTAINER_NAME: &str = "checkup";
const CONTAINER_MEMORY: &str = "100M";
const CONTAINER_CPU: &str = "1";
const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 5;

fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string())])
}

fn meta(name: &str, namespace: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        labels: Some(managed_labels()),
        ..Default::default()
    }
}

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: meta(name, None),
        ..Default::default()
    }
}

pub fn service_account(name: &str, namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: meta(name, Some(namespace)),
        ..Default::default()
    }
}

pub fn results_config_map(name: &str, namespace: &str) -> ConfigMap {
    ConfigMap {
        metadata: meta(name, Some(namespace)),
        ..Default::default()
    }
}

/// Role allowing exactly get/update/patch on the single named ConfigMap.
pub fn results_writer_role(name: &str, namespace: &str, config_map: &str) -> Role {
    Role {
        metadata: meta(name, Some(namespace)),
        rules: Some(vec![PolicyRule {
            verbs: vec!["get".into(), "update".into(), "patch".into()],
            api_groups: Some(vec![String::new()]),
            resources: Some(vec!["configmaps".into()]),
            resource_names: Some(vec![config_map.to_string()]),
            ..Default::default()
        }]),
    }
}

pub fn service_account_subject(name: &str, namespace: &str) -> Subject {
    Subject {
        kind: "ServiceAccount".into(),
        name: name.to_string(),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn role_ref(kind: &str, name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_API_GROUP.into(),
        kind: kind.into(),
        name: name.to_string(),
    }
}

/// Namespaced binding of `role_kind`/`role_name` to `subject`.
pub fn role_binding(
    name: &str,
    namespace: &str,
    role_kind: &str,
    role_name: &str,
    subject: Subject,
) -> RoleBinding {
    RoleBinding {
        metadata: meta(name, Some(namespace)),
        role_ref: role_ref(role_kind, role_name),
        subjects: Some(vec![subject]),
    }
}

/// Cluster-wide binding of a pre-existing ClusterRole to `subject`.
pub fn cluster_role_binding(name: &str, cluster_role: &str, subject: Subject) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: meta(name, None),
        role_ref: role_ref(CLUSTER_ROLE_KIND, cluster_role),
        subjects: Some(vec![subject]),
    }
}

/// Single-attempt job running `image` under `service_account`.
///
/// The job carries `label_key=name` on its own metadata so a label-filtered watch sees it.
pub fn checkup_job(
    name: &str,
    namespace: &str,
    label_key: &str,
    image: &str,
    env: &Env,
    service_account: &str,
) -> Job {
    let resources = BTreeMap::from([
        ("memory".to_string(), Quantity(CONTAINER_MEMORY.into())),
        ("cpu".to_string(), Quantity(CONTAINER_CPU.into())),
    ]);

    let container = Container {
        name: CONTAINER_NAME.into(),
        image: Some(image.to_string()),
        image_pull_policy: Some("Always".into()),
        env: Some(
            env.iter()
                .map(|kv| EnvVar {
                    name: kv.key().to_string(),
                    value: Some(kv.value().to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
        resources: Some(ResourceRequirements {
            limits: Some(resources.clone()),
            requests: Some(resources),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut metadata = meta(name, Some(namespace));
    metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(label_key.to_string(), name.to_string());

    Job {
        metadata,
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    service_account_name: Some(service_account.to_string()),
                    restart_policy: Some("Never".into()),
                    termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECONDS),
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}
