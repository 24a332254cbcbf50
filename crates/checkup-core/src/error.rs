use thiserror::Error;

use checkup_model::ModelError;

use crate::{
    cluster::ClusterError, job::ExecutionError, provision::ProvisionError, status::PublishError,
    teardown::TeardownError,
};

/// Any failure of a launcher run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("failed to read checkup ConfigMap: {0}")]
    Load(#[source] ClusterError),

    #[error("invalid checkup configuration: {0}")]
    Configuration(#[from] ModelError),

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("failed to read checkup results: {0}")]
    Observation(#[source] ClusterError),

    #[error(transparent)]
    Teardown(#[from] TeardownError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
