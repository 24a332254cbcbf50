mod checkup;
pub use checkup::{CheckupStatus, Succeeded, Verdict};

mod launcher;
pub use launcher::{FinalStatus, LauncherStatus};

mod report;
pub use report::{WorkloadReport, WorkloadTarget};
