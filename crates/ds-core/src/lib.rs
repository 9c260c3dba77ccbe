//! ds-core: Core configuration and process utilities for devstack
//!
//! This crate provides the configuration model, error types, PID file
//! handling and process-table helpers shared by the orchestrator and the CLI.

pub mod config;
pub mod error;
pub mod pidfile;
pub mod process;
pub mod types;

pub use error::{ConfigError, OrchestratorError, ProcessError};
pub use pidfile::{PidFile, PidFileGuard};
pub use types::{ExitOutcome, ServiceRole};
