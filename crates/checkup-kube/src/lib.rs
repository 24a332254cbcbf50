//! [`checkup_core::cluster::ClusterApi`] backed by a live Kubernetes API server.
mod error;
pub use error::classify;

mod watch;

mod cluster;
pub use cluster::KubeCluster;
