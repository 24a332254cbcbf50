mod config;

use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};

use checkup_core::prelude::{LaunchReport, Launcher};
use checkup_kube::KubeCluster;
use checkup_observe::init_logger;

use crate::config::LauncherConfig;

fn main() -> anyhow::Result<ExitCode> {
    // 1) config + logger, before any thread exists so a local log offset can be detected
    let cfg = LauncherConfig::from_env()?;
    init_logger(&cfg.logger)?;
    info!(
        namespace = %cfg.spec_namespace,
        name = %cfg.spec_name,
        "checkup launcher starting"
    );

    // 2) runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    // 3) run
    let report = runtime.block_on(run(&cfg))?;

    for err in &report.errors {
        error!(error = %err, "checkup launcher error");
    }
    if report.is_success() {
        info!("checkup succeeded");
        Ok(ExitCode::SUCCESS)
    } else {
        if let Some(status) = &report.status {
            error!(reason = %status.failure_reason(), "checkup failed");
        }
        Ok(ExitCode::FAILURE)
    }
}

async fn run(cfg: &LauncherConfig) -> anyhow::Result<LaunchReport> {
    let cluster = KubeCluster::try_default()
        .await
        .context("failed to create cluster client")?;

    Ok(Launcher::new(&cluster)
        .with_workspace_prefix(cfg.workspace_prefix.as_str())
        .run(&cfg.spec_namespace, &cfg.spec_name)
        .await)
}
