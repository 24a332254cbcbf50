//! Launching the checkup job and waiting for its terminal state.
use std::{fmt, time::Duration};

use k8s_openapi::api::batch::v1::Job;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    cluster::{ClusterApi, ClusterError, ClusterEvent, JobWatch},
    workspace::Workspace,
};

const CONDITION_COMPLETE: &str = "Complete";
const CONDITION_FAILED: &str = "Failed";

/// Observed lifecycle state of the checkup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

impl JobState {
    /// Derive the state from the job's conditions; only conditions with status `True` count.
    pub fn of(job: &Job) -> Self {
        let conditions = job
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default();

        let active = |type_: &str| {
            conditions
                .iter()
                .any(|c| c.type_ == type_ && c.status == "True")
        };

        if active(CONDITION_FAILED) {
            JobState::Failed
        } else if active(CONDITION_COMPLETE) {
            JobState::Completed
        } else {
            JobState::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// Job that reached `Completed` or `Failed`, with its last observed object.
#[derive(Debug, Clone)]
pub struct TerminalJob {
    pub state: JobState,
    pub job: Job,
}

impl TerminalJob {
    /// `"<reason>: <message>"` of the active `Failed` condition.
    pub fn failure_reason(&self) -> String {
        let failed = self
            .job
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_deref())
            .unwrap_or_default()
            .iter()
            .find(|c| c.type_ == CONDITION_FAILED && c.status == "True");

        match failed.map(|c| (c.reason.as_deref(), c.message.as_deref())) {
            Some((Some(reason), Some(message))) => format!("{reason}: {message}"),
            Some((Some(s), None)) | Some((None, Some(s))) => s.to_string(),
            _ => "job failed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("failed to create checkup job: {0}")]
    Start(#[source] ClusterError),

    #[error("failed to watch checkup job: {0}")]
    Watch(#[source] ClusterError),

    #[error("checkup job watch closed before the job finished")]
    WatchClosed,

    #[error("checkup job was deleted before it finished")]
    JobDeleted,

    #[error("checkup job failed: {reason}")]
    JobFailed { reason: String },

    #[error("timeout waiting for checkup job to finish after {timeout:?}")]
    TimedOut { timeout: Duration },
}

/// Runs the single checkup job of a workspace.
pub struct JobRunner<'c, C: ?Sized> {
    cluster: &'c C,
}

impl<'c, C> JobRunner<'c, C>
where
    C: ClusterApi + ?Sized,
{
    pub fn new(cluster: &'c C) -> Self {
        Self { cluster }
    }

    /// Submit the workspace job.
    ///
    /// Once this returns the job is `Pending`; the created object is stored in `ws`.
    #[instrument(level = "debug", skip(self, ws), fields(namespace = %ws.namespace()))]
    pub async fn start(&self, ws: &mut Workspace) -> Result<(), ExecutionError> {
        let created = self
            .cluster
            .create_job(ws.namespace(), &ws.job_template())
            .await
            .map_err(ExecutionError::Start)?;
        info!(namespace = %ws.namespace(), job = %ws.names().job(), image = %ws.image(), "checkup job created");
        ws.set_job(created);
        Ok(())
    }

    /// Wait until the started job completes, fails, or `ws.timeout()` elapses.
    ///
    /// The watch is released on every return path. On timeout the job is left
    /// running; it goes away with the namespace.
    #[instrument(level = "debug", skip(self, ws), fields(namespace = %ws.namespace()))]
    pub async fn wait(&self, ws: &mut Workspace) -> Result<TerminalJob, ExecutionError> {
        let selector = ws.names().job_selector();
        let mut watch = self
            .cluster
            .watch_jobs(ws.namespace(), &selector)
            .await
            .map_err(ExecutionError::Watch)?;

        let outcome = wait_terminal(&mut watch, ws.timeout()).await;
        watch.close();

        match outcome {
            Ok(terminal) => {
                ws.set_job(terminal.job.clone());
                info!(job = %ws.names().job(), state = %terminal.state, "checkup job finished");
                Ok(terminal)
            }
            Err(err) => {
                warn!(job = %ws.names().job(), error = %err, "checkup job did not finish");
                Err(err)
            }
        }
    }

    /// [`start`](Self::start) followed by [`wait`](Self::wait).
    pub async fn run(&self, ws: &mut Workspace) -> Result<TerminalJob, ExecutionError> {
        self.start(ws).await?;
        self.wait(ws).await
    }
}

async fn wait_terminal(watch: &mut JobWatch, timeout: Duration) -> Result<TerminalJob, ExecutionError> {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        // Buffered events win over an expired deadline.
        tokio::select! {
            biased;
            event = watch.next() => {
                let Some(event) = event else {
                    return Err(ExecutionError::WatchClosed);
                };
                match event {
                    ClusterEvent::Applied(job) => {
                        let state = JobState::of(&job);
                        debug!(state = %state, "checkup job event");
                        if state.is_terminal() {
                            return Ok(TerminalJob { state, job });
                        }
                    }
                    ClusterEvent::Deleted(job) => {
                        let state = JobState::of(&job);
                        debug!(state = %state, "checkup job deleted");
                        if state.is_terminal() {
                            return Ok(TerminalJob { state, job });
                        }
                        return Err(ExecutionError::JobDeleted);
                    }
                    ClusterEvent::Marker(kind) => trace!(kind, "skipping watch marker"),
                    ClusterEvent::Error(err) => return Err(ExecutionError::Watch(err)),
                }
            }
            _ = &mut deadline => {
                return Err(ExecutionError::TimedOut { timeout });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::fake::{FakeCluster, job_with_condition, pending_job, spec},
        workspace::WorkspaceNames,
    };

    fn workspace(timeout: &str) -> Workspace {
        Workspace::new(
            &spec(&[("spec.image", "registry/checkup:v1"), ("spec.timeout", timeout)]),
            WorkspaceNames::with_namespace("ws"),
        )
    }

    #[test]
    fn state_counts_only_true_conditions() {
        assert_eq!(JobState::of(&pending_job()), JobState::Pending);
        assert_eq!(JobState::of(&job_with_condition("Complete", "True")), JobState::Completed);
        assert_eq!(JobState::of(&job_with_condition("Complete", "False")), JobState::Pending);
        assert_eq!(JobState::of(&job_with_condition("Failed", "True")), JobState::Failed);
        assert_eq!(JobState::of(&job_with_condition("Suspended", "True")), JobState::Pending);
    }

    #[test]
    fn failure_reason_from_condition() {
        let terminal = TerminalJob {
            state: JobState::Failed,
            job: job_with_condition("Failed", "True"),
        };
        assert_eq!(terminal.failure_reason(), "FailedReason: job is Failed");

        let bare = TerminalJob {
            state: JobState::Failed,
            job: pending_job(),
        };
        assert_eq!(bare.failure_reason(), "job failed");
    }

    #[tokio::test(start_paused = true)]
    async fn completes_and_returns_last_job() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Marker("init"));
        cluster.queue_event(ClusterEvent::Applied(pending_job()));
        cluster.queue_event(ClusterEvent::Marker("bookmark"));
        cluster.queue_event(ClusterEvent::Applied(job_with_condition("Complete", "True")));
        let mut ws = workspace("5m");

        let terminal = JobRunner::new(&cluster).run(&mut ws).await.unwrap();

        assert_eq!(terminal.state, JobState::Completed);
        assert_eq!(JobState::of(ws.job().unwrap()), JobState::Completed);
        assert_eq!(cluster.calls(), vec!["create_job:checkup-job", "watch_jobs:job-name=checkup-job"]);
        assert!(cluster.watch_sender().unwrap().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_job_is_terminal() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Applied(job_with_condition("Failed", "True")));
        let mut ws = workspace("5m");

        let terminal = JobRunner::new(&cluster).run(&mut ws).await.unwrap();

        assert_eq!(terminal.state, JobState::Failed);
        assert!(cluster.watch_sender().unwrap().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_releases_watch() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Applied(pending_job()));
        let mut ws = workspace("30s");
        let runner = JobRunner::new(&cluster);

        for _ in 0..3 {
            let err = runner.run(&mut ws).await.unwrap_err();
            assert_eq!(
                err,
                ExecutionError::TimedOut {
                    timeout: Duration::from_secs(30)
                }
            );
            assert!(cluster.watch_sender().unwrap().is_closed());
        }
        assert_eq!(cluster.count("watch_jobs"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn buffered_event_wins_over_expired_deadline() {
        let cluster = FakeCluster::new();
        let mut ws = workspace("1s");
        let runner = JobRunner::new(&cluster);
        runner.start(&mut ws).await.unwrap();

        let mut watch = cluster.watch_jobs("ws", "job-name=checkup-job").await.unwrap();
        let tx = cluster.watch_sender().unwrap();
        tx.unbounded_send(ClusterEvent::Applied(job_with_condition("Complete", "True")))
            .unwrap();

        let terminal = wait_terminal(&mut watch, Duration::ZERO).await.unwrap();
        assert_eq!(terminal.state, JobState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_error_ends_the_wait_without_timing_out() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Applied(pending_job()));
        cluster.queue_event(ClusterEvent::Error(ClusterError::Forbidden(
            "jobs.batch is forbidden".into(),
        )));
        cluster.queue_event(ClusterEvent::Applied(job_with_condition("Complete", "True")));
        let mut ws = workspace("5m");

        let err = JobRunner::new(&cluster).run(&mut ws).await.unwrap_err();

        assert_eq!(
            err,
            ExecutionError::Watch(ClusterError::Forbidden("jobs.batch is forbidden".into()))
        );
        assert!(cluster.watch_sender().unwrap().is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_an_unfinished_job_fails_fast() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Applied(pending_job()));
        cluster.queue_event(ClusterEvent::Deleted(pending_job()));
        let mut ws = workspace("5m");
        let started = tokio::time::Instant::now();

        let err = JobRunner::new(&cluster).run(&mut ws).await.unwrap_err();

        assert_eq!(err, ExecutionError::JobDeleted);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn deletion_after_completion_keeps_the_outcome() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Deleted(job_with_condition("Complete", "True")));
        let mut ws = workspace("5m");

        let terminal = JobRunner::new(&cluster).run(&mut ws).await.unwrap();

        assert_eq!(terminal.state, JobState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_stream_is_an_error() {
        let cluster = FakeCluster::new();
        cluster.queue_event(ClusterEvent::Applied(pending_job()));
        cluster.close_watch_after_queued();
        let mut ws = workspace("5m");

        let err = JobRunner::new(&cluster).run(&mut ws).await.unwrap_err();

        assert_eq!(err, ExecutionError::WatchClosed);
    }

    #[tokio::test]
    async fn create_failure_skips_watch() {
        let cluster = FakeCluster::new();
        cluster.fail("create_job", ClusterError::Forbidden("jobs is forbidden".into()));
        let mut ws = workspace("5m");

        let err = JobRunner::new(&cluster).run(&mut ws).await.unwrap_err();

        assert!(matches!(err, ExecutionError::Start(ClusterError::Forbidden(_))));
        assert_eq!(cluster.count("watch_jobs"), 0);
        assert!(ws.job().is_none());
    }
}
