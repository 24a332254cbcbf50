mod domain;
pub use domain::keys;
pub use domain::{ConfigData, Env, KeyValue, env_safe_name};

mod error;
pub use error::{ModelError, ModelResult};

mod spec;
pub use spec::CheckupSpec;

mod status;
pub use status::{
    CheckupStatus, FinalStatus, LauncherStatus, Succeeded, Verdict, WorkloadReport,
    WorkloadTarget,
};

mod cni;
pub use cni::CniConfig;
