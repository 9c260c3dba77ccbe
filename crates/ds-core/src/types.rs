//! Core types shared by the orchestrator and the CLI

use std::fmt;

/// The processes devstack knows how to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    /// In-memory cache server, started detached
    Cache,
    /// Dashboard front-end
    Ui,
    /// Backend API server
    Api,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRole::Cache => write!(f, "cache server"),
            ServiceRole::Ui => write!(f, "dashboard"),
            ServiceRole::Api => write!(f, "API server"),
        }
    }
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Terminating signal number (unix only)
    pub signal: Option<i32>,
}

impl ExitOutcome {
    /// Outcome of a normal exit with the given code
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Outcome of a process killed by a signal
    pub fn signalled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code a shell would report for this outcome (128 + signal when killed)
    pub fn shell_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "killed by signal {}", signal),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}
