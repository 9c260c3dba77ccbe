//! `devstack up`: run the orchestrator in the foreground

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use ds_core::config::{self, InstallFailurePolicy, LauncherConfig};
use ds_core::PidFile;
use ds_orchestrator::{Orchestrator, OsSignals, SystemRuntime};

use crate::output::print_info;

/// Command-line overrides applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct UpOverrides {
    pub skip_install: bool,
    pub no_cache: bool,
    pub abort_on_install_failure: bool,
    pub ui_port: Option<u16>,
    pub api_host: Option<String>,
    pub api_port: Option<u16>,
}

impl UpOverrides {
    /// Apply the overrides to `config`
    pub fn apply(&self, config: &mut LauncherConfig) {
        if self.skip_install {
            config.install.enabled = false;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.abort_on_install_failure {
            config.install.on_failure = InstallFailurePolicy::Abort;
        }
        if let Some(port) = self.ui_port {
            config.ui.port = port;
        }
        if let Some(host) = &self.api_host {
            config.api.host = host.clone();
        }
        if let Some(port) = self.api_port {
            config.api.port = port;
        }
    }
}

/// Run the full startup sequence and supervise until exit or signal
///
/// Returns the exit code the process should terminate with.
pub async fn up_command(
    config_path: Option<&Path>,
    overrides: &UpOverrides,
    quiet: bool,
) -> Result<i32> {
    let mut launcher = config::resolve_config(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load configuration".to_string(),
    })?;
    overrides.apply(&mut launcher);
    launcher.validate().context("Invalid configuration")?;

    let pid_path = launcher.pid_file_path();
    let _guard = match PidFile::new(&pid_path).acquire() {
        Ok(guard) => guard,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            anyhow::bail!(
                "devstack is already running ({}); stop it with 'devstack stop'",
                e
            );
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to write PID file {:?}", pid_path));
        }
    };

    if !quiet {
        print_info(&format!(
            "Dashboard on port {}, API on {}",
            launcher.ui.port,
            launcher.api.bind_address()
        ));
    }

    tracing::info!("devstack starting...");
    let runtime = SystemRuntime::new(launcher.working_dir.clone());
    let orchestrator = Orchestrator::new(launcher, Arc::new(runtime));
    let mut signals = OsSignals::new();

    let summary = orchestrator.run(&mut signals).await?;
    tracing::debug!("Run finished: {:?}", summary);

    Ok(summary.exit_code())
}
