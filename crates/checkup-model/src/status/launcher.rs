use std::collections::BTreeMap;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    ConfigData,
    domain::keys,
    status::checkup::{CheckupStatus, Verdict},
};

/// Outcome recorded by the launcher itself during one run.
///
/// Every field is set at most once: later calls to the `mark_*`/`record_*` methods are ignored,
/// so the first recorded failure stays the primary one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LauncherStatus {
    failure: Option<String>,
    started_at: Option<OffsetDateTime>,
    completed_at: Option<OffsetDateTime>,
}

impl LauncherStatus {
    /// Status with nothing recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the job-launch time.
    pub fn mark_started(&mut self, at: OffsetDateTime) {
        self.started_at.get_or_insert(at);
    }

    /// Record the time the job reached a terminal state or timed out.
    pub fn mark_completed(&mut self, at: OffsetDateTime) {
        self.completed_at.get_or_insert(at);
    }

    /// Record the launcher-side failure of this run.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.failure.get_or_insert_with(|| reason.into());
    }

    /// The first recorded launcher failure.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Job-launch time, if the job was started.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    /// Terminal or timeout time.
    pub fn completed_at(&self) -> Option<OffsetDateTime> {
        self.completed_at
    }

    /// Merge the launcher's outcome with what the workload reported.
    ///
    /// The launcher's verdict wins; the workload only decides the outcome of a run the
    /// launcher itself considers successful, and only by explicitly reporting `false`.
    pub fn merge(&self, workload: &CheckupStatus) -> FinalStatus {
        let (succeeded, failure_reason) = match (&self.failure, workload.verdict()) {
            (Some(reason), Verdict::Reported(false)) => (
                false,
                format!("{reason}; checkup: {}", workload.failure_reason()),
            ),
            (Some(reason), _) => (false, reason.clone()),
            (None, Verdict::Reported(false) | Verdict::Illegal(_) | Verdict::Unreadable) => {
                (false, workload.failure_reason().to_string())
            }
            (None, Verdict::Reported(true) | Verdict::Missing) => (true, String::new()),
        };

        FinalStatus {
            succeeded,
            failure_reason,
            start_timestamp: format_timestamp(self.started_at),
            completion_timestamp: format_timestamp(self.completed_at),
            results: workload.results().clone(),
        }
    }
}

/// Combined status written back into the checkup ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalStatus {
    succeeded: bool,
    failure_reason: String,
    start_timestamp: String,
    completion_timestamp: String,
    results: BTreeMap<String, String>,
}

impl FinalStatus {
    /// Overall outcome of the run.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Combined reason, empty on success.
    pub fn failure_reason(&self) -> &str {
        &self.failure_reason
    }

    /// Rendered start time, empty when unset.
    pub fn start_timestamp(&self) -> &str {
        &self.start_timestamp
    }

    /// Rendered completion time, empty when unset.
    pub fn completion_timestamp(&self) -> &str {
        &self.completion_timestamp
    }

    /// Workload metrics, without the `status.result.` prefix.
    pub fn results(&self) -> &BTreeMap<String, String> {
        &self.results
    }

    /// Write this status into `data`.
    ///
    /// Any `status.*` key left from a previous run is removed first; keys outside the
    /// `status.` namespace are preserved untouched.
    pub fn write_into(&self, data: &mut ConfigData) {
        data.remove_prefixed(keys::STATUS_PREFIX);
        data.insert(keys::STATUS_SUCCEEDED_KEY, self.succeeded.to_string())
            .insert(keys::STATUS_FAILURE_REASON_KEY, self.failure_reason.as_str())
            .insert(keys::STATUS_START_TIMESTAMP_KEY, self.start_timestamp.as_str())
            .insert(
                keys::STATUS_COMPLETION_TIMESTAMP_KEY,
                self.completion_timestamp.as_str(),
            );
        for (name, value) in &self.results {
            data.insert(format!("{}{name}", keys::STATUS_RESULT_PREFIX), value.as_str());
        }
    }
}

/// RFC3339, UTC, whole seconds. Unset timestamps render as an empty string.
fn format_timestamp(at: Option<OffsetDateTime>) -> String {
    at.and_then(|t| t.to_offset(time::UtcOffset::UTC).replace_nanosecond(0).ok())
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}
