//! Release of everything a workspace created.
//!
//! The namespace deletion cascades to every namespaced object (service account, results
//! ConfigMap, Role, RoleBindings and the job). ClusterRoleBindings are cluster scoped and
//! are deleted one by one. Both groups are always attempted and run concurrently.
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    cluster::{ClusterApi, ClusterError},
    workspace::Workspace,
};

/// One resource that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {name}: {source}")]
pub struct TeardownFailure {
    pub kind: &'static str,
    pub name: String,
    #[source]
    pub source: ClusterError,
}

/// Every deletion failure of one teardown, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to tear down checkup environment: {}", join(.failures))]
pub struct TeardownError {
    failures: Vec<TeardownFailure>,
}

impl TeardownError {
    pub fn failures(&self) -> &[TeardownFailure] {
        &self.failures
    }
}

fn join(failures: &[TeardownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Teardown<'c, C: ?Sized> {
    cluster: &'c C,
}

impl<'c, C> Teardown<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(cluster: &'c C) -> Self {
        Self { cluster }
    }

    /// Delete the workspace. Consumes it, so a workspace is torn down at most once.
    ///
    /// Resources that are already gone do not count as failures.
    #[instrument(level = "debug", skip(self, ws), fields(namespace = %ws.namespace()))]
    pub async fn run(&self, ws: Workspace) -> Result<(), TeardownError> {
        let created = ws.created();
        let namespace = ws.namespace();

        let namespace_deletion = async {
            if !created.namespace {
                return None;
            }
            Some(
                self.delete("Namespace", namespace, self.cluster.delete_namespace(namespace))
                    .await,
            )
        };
        let binding_deletions = join_all(created.cluster_role_bindings.iter().map(|name| {
            self.delete(
                "ClusterRoleBinding",
                name,
                self.cluster.delete_cluster_role_binding(name),
            )
        }));

        let (ns_result, binding_results) = tokio::join!(namespace_deletion, binding_deletions);

        let failures: Vec<TeardownFailure> = ns_result
            .into_iter()
            .chain(binding_results)
            .filter_map(Result::err)
            .collect();

        if failures.is_empty() {
            info!(namespace = %namespace, "checkup environment torn down");
            Ok(())
        } else {
            Err(TeardownError { failures })
        }
    }

    async fn delete<F>(&self, kind: &'static str, name: &str, call: F) -> Result<(), TeardownFailure>
    where
        F: Future<Output = Result<(), ClusterError>>,
    {
        match call.await {
            Ok(()) => {
                info!(kind, name, "deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(kind, name, "already deleted");
                Ok(())
            }
            Err(source) => {
                warn!(kind, name, error = %source, "failed to delete");
                Err(TeardownFailure {
                    kind,
                    name: name.to_string(),
                    source,
                })
            }
        }
    }
}
