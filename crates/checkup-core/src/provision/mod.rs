//! Creation of the checkup sandbox.
//!
//! Resources are created in a fixed order:
//! namespace → service account → results ConfigMap → results writer Role →
//! RoleBindings → ClusterRoleBindings.
//! The first failure aborts setup; nothing is rolled back here. Everything created up
//! to that point is recorded in the [`Workspace`] and released by teardown.
use std::fmt;

use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    cluster::{ClusterApi, ClusterError},
    workspace::{
        Workspace,
        objects::{self, CLUSTER_ROLE_KIND, ROLE_KIND},
    },
};

/// Setup step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    Namespace,
    ServiceAccount,
    ResultsConfigMap,
    ResultsWriterRole,
    RoleBinding,
    ClusterRoleBinding,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvisionStep::Namespace => "namespace",
            ProvisionStep::ServiceAccount => "service account",
            ProvisionStep::ResultsConfigMap => "results ConfigMap",
            ProvisionStep::ResultsWriterRole => "results ConfigMap writer Role",
            ProvisionStep::RoleBinding => "RoleBinding",
            ProvisionStep::ClusterRoleBinding => "ClusterRoleBinding",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to create checkup environment: {step} '{name}': {source}")]
pub struct ProvisionError {
    pub step: ProvisionStep,
    pub name: String,
    #[source]
    pub source: ClusterError,
}

fn fail(step: ProvisionStep, name: &str) -> impl FnOnce(ClusterError) -> ProvisionError {
    let name = name.to_string();
    move |source| ProvisionError { step, name, source }
}

/// Creates the sandbox described by a [`Workspace`].
pub struct Provisioner<'c, C: ?Sized> {
    cluster: &'c C,
}

impl<'c, C> Provisioner<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(cluster: &'c C) -> Self {
        Self { cluster }
    }

    /// Create every resource of `ws`, in order.
    ///
    /// On error `ws` still records what was created before the failing step.
    #[instrument(level = "debug", skip(self, ws), fields(namespace = %ws.namespace()))]
    pub async fn setup(&self, ws: &mut Workspace) -> Result<(), ProvisionError> {
        let names = ws.names().clone();
        let ns = names.namespace();
        self.cluster
            .create_namespace(&objects::namespace(ns))
            .await
            .map_err(fail(ProvisionStep::Namespace, ns))?;
        ws.created_mut().namespace = true;
        info!(namespace = %ns, "checkup namespace created");

        let sa = names.service_account();
        self.cluster
            .create_service_account(ns, &objects::service_account(sa, ns))
            .await
            .map_err(fail(ProvisionStep::ServiceAccount, sa))?;
        ws.created_mut().service_account = true;
        info!(namespace = %ns, service_account = sa, "checkup service account created");

        let cm = names.results_config_map();
        self.cluster
            .create_config_map(ns, &objects::results_config_map(cm, ns))
            .await
            .map_err(fail(ProvisionStep::ResultsConfigMap, cm))?;
        ws.created_mut().results_config_map = true;
        info!(namespace = %ns, config_map = cm, "checkup results ConfigMap created");

        let writer = names.results_writer_role();
        self.cluster
            .create_role(ns, &objects::results_writer_role(writer, ns, cm))
            .await
            .map_err(fail(ProvisionStep::ResultsWriterRole, writer))?;
        ws.created_mut().roles.push(writer.to_string());
        info!(namespace = %ns, role = writer, "results ConfigMap writer Role created");

        let subject = objects::service_account_subject(sa, ns);

        // The writer Role first, then one namespaced binding per requested permission.
        let mut bindings = vec![(ROLE_KIND, writer.to_string(), names.role_binding(writer))];
        bindings.extend(
            ws.roles()
                .iter()
                .map(|r| (CLUSTER_ROLE_KIND, r.clone(), names.requested_role_binding(r))),
        );
        for (kind, role, binding) in bindings {
            self.cluster
                .create_role_binding(
                    ns,
                    &objects::role_binding(&binding, ns, kind, &role, subject.clone()),
                )
                .await
                .map_err(fail(ProvisionStep::RoleBinding, binding.as_str()))?;
            ws.created_mut().role_bindings.push(binding.clone());
            info!(namespace = %ns, binding = %binding, role = %role, "RoleBinding created");
        }

        let cluster_roles: Vec<String> = ws.cluster_roles().iter().cloned().collect();
        for cluster_role in cluster_roles {
            let binding = names.cluster_role_binding(&cluster_role);
            self.cluster
                .create_cluster_role_binding(&objects::cluster_role_binding(
                    &binding,
                    &cluster_role,
                    subject.clone(),
                ))
                .await
                .map_err(fail(ProvisionStep::ClusterRoleBinding, binding.as_str()))?;
            ws.created_mut().cluster_role_bindings.push(binding.clone());
            info!(binding = %binding, cluster_role = %cluster_role, "ClusterRoleBinding created");
        }

        Ok(())
    }
}
