//! Process runtime abstraction
//!
//! The orchestrator never touches `tokio::process` directly; it talks to a
//! [`ProcessRuntime`] so the startup sequence can be driven against a fake
//! process table in tests.

mod system;

pub use system::SystemRuntime;

use async_trait::async_trait;

use ds_core::config::CommandSpec;
use ds_core::{ExitOutcome, ProcessError};

/// Operations the orchestrator needs from the operating system
#[async_trait]
pub trait ProcessRuntime: Send + Sync {
    /// PIDs of running processes with the given name
    async fn find_running(&self, process_name: &str) -> Result<Vec<u32>, ProcessError>;

    /// Start a process without keeping a handle to it
    ///
    /// Returns the PID of the spawned process when the OS reports one.
    async fn spawn_detached(&self, command: &CommandSpec) -> Result<Option<u32>, ProcessError>;

    /// Run a process and block until it exits
    async fn run_to_completion(&self, command: &CommandSpec) -> Result<ExitOutcome, ProcessError>;

    /// Start a tracked background process
    async fn spawn(&self, command: &CommandSpec) -> Result<Box<dyn RunningChild>, ProcessError>;

    /// Request termination of a process by PID
    fn terminate(&self, pid: u32) -> Result<(), ProcessError>;
}

/// A spawned child the orchestrator can wait on
#[async_trait]
pub trait RunningChild: Send {
    /// OS process identifier, if the child has not been reaped yet
    fn pid(&self) -> Option<u32>;

    /// Wait for the child to exit
    async fn wait(&mut self) -> Result<ExitOutcome, ProcessError>;
}
