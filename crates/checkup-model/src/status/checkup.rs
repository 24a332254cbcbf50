use std::{collections::BTreeMap, fmt};

use crate::{ConfigData, domain::keys};

/// Default failure reason when the workload did not provide one.
pub const UNKNOWN_REASON: &str = "Unknown";

/// Tri-state success flag as seen by the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Succeeded {
    /// The workload reported success.
    True,
    /// Failure, or no usable success flag.
    False,
    /// The results object could not be read at all.
    Unknown,
}

impl Succeeded {
    /// Wire value of the flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Succeeded::True => "true",
            Succeeded::False => "false",
            Succeeded::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Succeeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the workload's success flag came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// `status.succeeded` held `"true"` or `"false"`.
    Reported(bool),
    /// `status.succeeded` was absent.
    Missing,
    /// `status.succeeded` held something else.
    Illegal(String),
    /// The results object itself was unreadable.
    Unreadable,
}

/// Status contributed by the workload through its results object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckupStatus {
    verdict: Verdict,
    failure_reason: String,
    results: BTreeMap<String, String>,
}

impl CheckupStatus {
    /// Parse the workload's contribution from the results object data.
    ///
    /// Only `status.succeeded`, `status.failureReason` and `status.result.*` are read;
    /// any other key is ignored. Result entries with empty values are skipped.
    pub fn from_data(data: &ConfigData) -> Self {
        let results = data
            .with_prefix(keys::STATUS_RESULT_PREFIX)
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let (verdict, failure_reason) = match data.get(keys::STATUS_SUCCEEDED_KEY) {
            None => (Verdict::Missing, "failed to read succeeded field".to_string()),
            Some(raw @ ("true" | "false")) => (
                Verdict::Reported(raw == "true"),
                data.get(keys::STATUS_FAILURE_REASON_KEY)
                    .unwrap_or(UNKNOWN_REASON)
                    .to_string(),
            ),
            Some(other) => (
                Verdict::Illegal(other.to_string()),
                "illegal value in succeeded field".to_string(),
            ),
        };

        Self {
            verdict,
            failure_reason,
            results,
        }
    }

    /// Status used when the results object could not be read.
    pub fn unreadable(reason: impl fmt::Display) -> Self {
        Self {
            verdict: Verdict::Unreadable,
            failure_reason: format!("failed to read checkup results: {reason}"),
            results: BTreeMap::new(),
        }
    }

    /// How the success flag was obtained.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    /// Flag derived from the verdict. Only a reported `"true"` counts as success.
    pub fn succeeded(&self) -> Succeeded {
        match self.verdict {
            Verdict::Reported(true) => Succeeded::True,
            Verdict::Reported(false) | Verdict::Missing | Verdict::Illegal(_) => Succeeded::False,
            Verdict::Unreadable => Succeeded::Unknown,
        }
    }

    /// Reason given by the workload, or the one derived from the verdict.
    pub fn failure_reason(&self) -> &str {
        &self.failure_reason
    }

    /// Workload metrics with the `status.result.` prefix stripped.
    pub fn results(&self) -> &BTreeMap<String, String> {
        &self.results
    }
}
