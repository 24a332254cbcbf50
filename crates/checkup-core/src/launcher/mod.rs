//! Top-level driver of one checkup run.
//!
//! Order of a run: load spec → setup → job → logs → collect → teardown → publish.
//! Only an unreadable or invalid spec, or a setup failure that left nothing behind,
//! stops the sequence early. Every other failure is recorded and the remaining steps
//! still run.
use checkup_model::{CheckupSpec, CheckupStatus, ConfigData, FinalStatus, LauncherStatus};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    cluster::ClusterApi,
    error::LaunchError,
    job::{ExecutionError, JobRunner, JobState},
    provision::Provisioner,
    status::StatusAggregator,
    teardown::Teardown,
    workspace::{DEFAULT_WORKSPACE_PREFIX, Workspace, WorkspaceNames},
};

/// Outcome of a launcher run.
#[derive(Debug, Clone, Default)]
pub struct LaunchReport {
    /// Status written into the checkup ConfigMap, if publishing succeeded.
    pub status: Option<FinalStatus>,
    /// Every error, in the order encountered.
    pub errors: Vec<LaunchError>,
}

impl LaunchReport {
    /// The failure that decided the run; later errors (teardown, publish) never replace it.
    pub fn primary(&self) -> Option<&LaunchError> {
        self.errors.first()
    }

    /// No errors and a published `succeeded=true`.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.status.as_ref().is_some_and(FinalStatus::succeeded)
    }
}

pub struct Launcher<'c, C: ?Sized> {
    cluster: &'c C,
    workspace_prefix: String,
}

impl<'c, C> Launcher<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(cluster: &'c C) -> Self {
        Self {
            cluster,
            workspace_prefix: DEFAULT_WORKSPACE_PREFIX.to_string(),
        }
    }

    /// Prefix of the generated sandbox namespace.
    pub fn with_workspace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.workspace_prefix = prefix.into();
        self
    }

    /// Run the checkup described by the ConfigMap `namespace/name` and publish its status there.
    #[instrument(skip(self), fields(workspace = tracing::field::Empty))]
    pub async fn run(&self, namespace: &str, name: &str) -> LaunchReport {
        let mut report = LaunchReport::default();

        let spec = match self.load(namespace, name).await {
            Ok(spec) => spec,
            Err(err) => {
                error!(error = %err, "checkup not started");
                report.errors.push(err);
                return report;
            }
        };

        let names = WorkspaceNames::generate(&self.workspace_prefix);
        tracing::Span::current().record("workspace", names.namespace());
        let mut ws = Workspace::new(&spec, names);
        let mut launcher = LauncherStatus::new();

        if let Err(err) = Provisioner::new(self.cluster).setup(&mut ws).await {
            error!(error = %err, "checkup environment setup failed");
            let now = OffsetDateTime::now_utc();
            launcher.record_failure(err.to_string());
            launcher.mark_started(now);
            launcher.mark_completed(now);
            report.errors.push(err.into());
            if !ws.needs_teardown() {
                return report;
            }
            self.finish(&mut report, ws, &launcher, None, namespace, name).await;
            return report;
        }

        let job_started = self.execute(&mut ws, &mut launcher, &mut report).await;

        let workload = if job_started {
            self.dump_logs(&ws).await;
            Some(self.collect(&ws, &mut report).await)
        } else {
            None
        };

        self.finish(&mut report, ws, &launcher, workload, namespace, name).await;
        report
    }

    async fn load(&self, namespace: &str, name: &str) -> Result<CheckupSpec, LaunchError> {
        let map = self
            .cluster
            .get_config_map(namespace, name)
            .await
            .map_err(LaunchError::Load)?;
        let data = map.data.map(ConfigData::from);
        let spec = CheckupSpec::from_data(data.as_ref())?;
        info!(image = %spec.image(), timeout = ?spec.timeout(), "checkup spec loaded");
        Ok(spec)
    }

    /// Launch the job and wait for it. Returns whether the job was created.
    async fn execute(
        &self,
        ws: &mut Workspace,
        launcher: &mut LauncherStatus,
        report: &mut LaunchReport,
    ) -> bool {
        let runner = JobRunner::new(self.cluster);

        launcher.mark_started(OffsetDateTime::now_utc());
        if let Err(err) = runner.start(ws).await {
            launcher.mark_completed(OffsetDateTime::now_utc());
            launcher.record_failure(err.to_string());
            report.errors.push(err.into());
            return false;
        }

        let outcome = runner.wait(ws).await;
        launcher.mark_completed(OffsetDateTime::now_utc());

        let failure = match outcome {
            Ok(terminal) if terminal.state == JobState::Completed => None,
            Ok(terminal) => Some(ExecutionError::JobFailed {
                reason: terminal.failure_reason(),
            }),
            Err(err) => Some(err),
        };
        if let Some(err) = failure {
            launcher.record_failure(err.to_string());
            report.errors.push(err.into());
        }
        true
    }

    async fn dump_logs(&self, ws: &Workspace) {
        match self
            .cluster
            .pod_logs(ws.namespace(), &ws.names().job_selector())
            .await
        {
            Ok(logs) => info!(job = %ws.names().job(), "checkup job logs:\n{logs}"),
            Err(err) => warn!(job = %ws.names().job(), error = %err, "failed to fetch checkup job logs"),
        }
    }

    async fn collect(&self, ws: &Workspace, report: &mut LaunchReport) -> CheckupStatus {
        match StatusAggregator::new(self.cluster).collect(ws).await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "failed to read checkup results");
                let status = CheckupStatus::unreadable(&err);
                report.errors.push(LaunchError::Observation(err));
                status
            }
        }
    }

    /// Teardown, then publish. Both always run.
    async fn finish(
        &self,
        report: &mut LaunchReport,
        ws: Workspace,
        launcher: &LauncherStatus,
        workload: Option<CheckupStatus>,
        namespace: &str,
        name: &str,
    ) {
        if let Err(err) = Teardown::new(self.cluster).run(ws).await {
            error!(error = %err, "checkup environment teardown failed");
            report.errors.push(err.into());
        }

        let workload = workload.unwrap_or_else(|| CheckupStatus::from_data(&ConfigData::new()));
        let status = launcher.merge(&workload);
        match StatusAggregator::new(self.cluster)
            .publish(namespace, name, &status)
            .await
        {
            Ok(_) => {
                info!(
                    succeeded = status.succeeded(),
                    reason = %status.failure_reason(),
                    "checkup finished"
                );
                report.status = Some(status);
            }
            Err(err) => {
                error!(error = %err, "failed to publish checkup status");
                report.errors.push(err.into());
            }
        }
    }
}
