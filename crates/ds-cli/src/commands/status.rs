//! Status command implementation

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpStream;

use ds_core::config::{self, LauncherConfig};
use ds_core::{process, PidFile, ServiceRole};

use crate::output::{format_pids, format_status, ComponentState, ComponentStatus, StatusReport};

/// How long a reachability probe may take
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Execute the status command
pub async fn status_command(config_path: Option<&Path>, json: bool) -> Result<()> {
    let launcher = config::resolve_config(config_path).context("Failed to load configuration")?;
    let report = collect_status(&launcher).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_status(&report));
    }
    Ok(())
}

/// Probe every component named in the configuration
pub async fn collect_status(launcher: &LauncherConfig) -> StatusReport {
    let pid_file = PidFile::new(launcher.pid_file_path());
    let orchestrator = match pid_file.live_pid() {
        Some(pid) => ComponentStatus {
            name: "devstack".to_string(),
            state: ComponentState::Running,
            detail: format!("PID {}", pid),
        },
        None => ComponentStatus {
            name: "devstack".to_string(),
            state: ComponentState::Stopped,
            detail: String::new(),
        },
    };

    let (cache, ui, api) = tokio::join!(
        cache_status(launcher),
        reachability(ServiceRole::Ui, launcher.ui.probe_address()),
        reachability(ServiceRole::Api, launcher.api.probe_address()),
    );

    StatusReport {
        components: vec![orchestrator, cache, ui, api],
    }
}

async fn cache_status(launcher: &LauncherConfig) -> ComponentStatus {
    let name = ServiceRole::Cache.to_string();
    if !launcher.cache.enabled {
        return ComponentStatus {
            name,
            state: ComponentState::Disabled,
            detail: String::new(),
        };
    }

    let process_name = launcher.cache.process_name.clone();
    let pids = tokio::task::spawn_blocking(move || process::find_processes_by_name(&process_name))
        .await
        .unwrap_or_else(|e| {
            tracing::debug!("Cache probe failed: {}", e);
            Vec::new()
        });

    if pids.is_empty() {
        ComponentStatus {
            name,
            state: ComponentState::Stopped,
            detail: launcher.cache.process_name.clone(),
        }
    } else {
        ComponentStatus {
            name,
            state: ComponentState::Running,
            detail: format!("PID {}", format_pids(&pids)),
        }
    }
}

async fn reachability(role: ServiceRole, address: String) -> ComponentStatus {
    let state = match tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(&address)).await {
        Ok(Ok(_)) => ComponentState::Reachable,
        Ok(Err(e)) => {
            tracing::debug!("{} not reachable at {}: {}", role, address, e);
            ComponentState::Unreachable
        }
        Err(_) => {
            tracing::debug!("{} probe at {} timed out", role, address);
            ComponentState::Unreachable
        }
    };

    ComponentStatus {
        name: role.to_string(),
        state,
        detail: address,
    }
}
