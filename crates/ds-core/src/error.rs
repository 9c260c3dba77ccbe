//! Core error types for devstack

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ExitOutcome;

/// Errors raised while spawning, probing or signalling OS processes
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a child failed
    #[error("Failed to wait on {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Delivering a signal failed
    #[error("Failed to signal PID {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// The process table could not be read
    #[error("Process probe failed: {0}")]
    Probe(String),
}

/// Errors that end an orchestrator run early
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Installer exited unsuccessfully under the `abort` policy
    #[error("Dependency installation failed ({0}); aborting before launch")]
    InstallFailed(ExitOutcome),

    /// Installer could not be run at all under the `abort` policy
    #[error("Dependency installer could not be started: {0}")]
    InstallerUnavailable(#[source] ProcessError),

    /// Signal handlers could not be installed
    #[error("Failed to register signal handlers: {0}")]
    SignalRegistration(#[source] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
