//! `devstack stop`: ask a running orchestrator to shut down

use std::path::Path;

use anyhow::{Context, Result};

use ds_core::config;
use ds_core::{process, PidFile};

use crate::output::{print_info, print_success, print_warning};

/// Send SIGTERM to the orchestrator named in the PID file
pub fn stop_command(config_path: Option<&Path>) -> Result<()> {
    let launcher = config::resolve_config(config_path).context("Failed to load configuration")?;
    let pid_file = PidFile::new(launcher.pid_file_path());

    let Some(pid) = pid_file.live_pid() else {
        if pid_file.path().exists() {
            tracing::debug!("Removing stale PID file {:?}", pid_file.path());
            if let Err(e) = pid_file.remove() {
                tracing::warn!("Failed to remove stale PID file: {}", e);
            }
        }
        print_warning("devstack is not running");
        return Ok(());
    };

    print_info("Stopping devstack...");
    process::terminate(pid).with_context(|| format!("Failed to signal PID {}", pid))?;
    print_success(&format!("Sent SIGTERM to devstack (PID {})", pid));
    Ok(())
}
