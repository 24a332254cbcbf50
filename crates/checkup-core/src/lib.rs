pub mod cluster;
pub mod error;
pub mod job;
pub mod launcher;
pub mod provision;
pub mod status;
pub mod teardown;
pub mod workspace;

pub mod prelude {
    pub use crate::cluster::{ClusterApi, ClusterError, ClusterEvent, ClusterResult, JobWatch};
    pub use crate::error::LaunchError;
    pub use crate::job::{ExecutionError, JobRunner, JobState, TerminalJob};
    pub use crate::launcher::{LaunchReport, Launcher};
    pub use crate::provision::{ProvisionError, ProvisionStep, Provisioner};
    pub use crate::status::{PublishError, StatusAggregator};
    pub use crate::teardown::{Teardown, TeardownError, TeardownFailure};
    pub use crate::workspace::{Workspace, WorkspaceNames};
}
