//! Well-known keys of the flat key/value objects exchanged with the cluster.
//!
//! The checkup ConfigMap carries `spec.*` keys, the results object and the final
//! status carry `status.*` keys.

pub const SPEC_IMAGE_KEY: &str = "spec.image";
pub const SPEC_TIMEOUT_KEY: &str = "spec.timeout";
pub const SPEC_PARAM_PREFIX: &str = "spec.param.";
pub const SPEC_CLUSTER_ROLES_KEY: &str = "spec.clusterRoles";
pub const SPEC_ROLES_KEY: &str = "spec.roles";

/// Prefix shared by every launcher- and workload-owned status key.
pub const STATUS_PREFIX: &str = "status.";
pub const STATUS_SUCCEEDED_KEY: &str = "status.succeeded";
pub const STATUS_FAILURE_REASON_KEY: &str = "status.failureReason";
pub const STATUS_START_TIMESTAMP_KEY: &str = "status.startTimestamp";
pub const STATUS_COMPLETION_TIMESTAMP_KEY: &str = "status.completionTimestamp";
pub const STATUS_RESULT_PREFIX: &str = "status.result.";

/// Environment variable naming the results object handed to the workload.
pub const RESULTS_NAME_ENV: &str = "RESULT_CONFIGMAP_NAME";
/// Environment variable naming the namespace of the results object.
pub const RESULTS_NAMESPACE_ENV: &str = "RESULT_CONFIGMAP_NAMESPACE";
