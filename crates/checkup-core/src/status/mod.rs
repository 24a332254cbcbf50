//! Reading the workload's results object and publishing the merged status.
use k8s_openapi::api::core::v1::ConfigMap;
use thiserror::Error;
use tracing::{debug, info, instrument};

use checkup_model::{CheckupStatus, ConfigData, FinalStatus};

use crate::{
    cluster::{ClusterApi, ClusterError},
    workspace::Workspace,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("failed to read checkup ConfigMap {namespace}/{name}: {source}")]
    Read {
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("failed to update checkup ConfigMap {namespace}/{name}: {source}")]
    Write {
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },
}

fn data_of(map: &ConfigMap) -> ConfigData {
    map.data.clone().map(ConfigData::from).unwrap_or_default()
}

pub struct StatusAggregator<'c, C: ?Sized> {
    cluster: &'c C,
}

impl<'c, C> StatusAggregator<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(cluster: &'c C) -> Self {
        Self { cluster }
    }

    /// Read the workload's contribution from the workspace results object.
    ///
    /// A missing `data` field reads as an empty report.
    #[instrument(level = "debug", skip(self, ws), fields(namespace = %ws.namespace()))]
    pub async fn collect(&self, ws: &Workspace) -> Result<CheckupStatus, ClusterError> {
        let map = self
            .cluster
            .get_config_map(ws.namespace(), ws.names().results_config_map())
            .await?;
        let status = CheckupStatus::from_data(&data_of(&map));
        debug!(
            succeeded = %status.succeeded(),
            results = status.results().len(),
            "checkup results collected"
        );
        Ok(status)
    }

    /// Write `status` into the checkup ConfigMap `namespace/name`.
    ///
    /// The object is re-read first; keys outside `status.` are preserved.
    #[instrument(level = "debug", skip(self, status))]
    pub async fn publish(
        &self,
        namespace: &str,
        name: &str,
        status: &FinalStatus,
    ) -> Result<ConfigMap, PublishError> {
        let mut map = self
            .cluster
            .get_config_map(namespace, name)
            .await
            .map_err(|source| PublishError::Read {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source,
            })?;

        let mut data = data_of(&map);
        status.write_into(&mut data);
        map.data = Some(data.into_inner());

        let updated = self
            .cluster
            .replace_config_map(namespace, &map)
            .await
            .map_err(|source| PublishError::Write {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source,
            })?;
        info!(namespace, name, succeeded = status.succeeded(), "checkup status published");
        Ok(updated)
    }
}
