//! Runtime backed by real OS processes

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use ds_core::config::CommandSpec;
use ds_core::{process, ExitOutcome, ProcessError};

use super::{ProcessRuntime, RunningChild};

/// Spawns children through `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemRuntime {
    /// Directory children are started in
    working_dir: Option<PathBuf>,
}

impl SystemRuntime {
    /// Create a runtime that starts children in `working_dir` (or the current directory)
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }

    fn command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).envs(&spec.env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl ProcessRuntime for SystemRuntime {
    async fn find_running(&self, process_name: &str) -> Result<Vec<u32>, ProcessError> {
        let name = process_name.to_string();
        tokio::task::spawn_blocking(move || process::find_processes_by_name(&name))
            .await
            .map_err(|e| ProcessError::Probe(e.to_string()))
    }

    async fn spawn_detached(&self, spec: &CommandSpec) -> Result<Option<u32>, ProcessError> {
        let child = self
            .command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        // Dropping the handle leaves the child running; tokio reaps it once it exits.
        Ok(child.id())
    }

    async fn run_to_completion(&self, spec: &CommandSpec) -> Result<ExitOutcome, ProcessError> {
        let mut child = self
            .command(spec)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            program: spec.program.clone(),
            source,
        })?;
        Ok(ExitOutcome::from(status))
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn RunningChild>, ProcessError> {
        let child = self
            .command(spec)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        Ok(Box::new(SystemChild {
            program: spec.program.clone(),
            child,
        }))
    }

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        process::terminate(pid)
    }
}

/// A child spawned by [`SystemRuntime`]
struct SystemChild {
    program: String,
    child: Child,
}

#[async_trait]
impl RunningChild for SystemChild {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
        let status = self.child.wait().await.map_err(|source| ProcessError::Wait {
            program: self.program.clone(),
            source,
        })?;
        Ok(ExitOutcome::from(status))
    }
}
