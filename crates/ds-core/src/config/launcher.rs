//! Launcher configuration: what to start and how

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default PID file name, placed in the config directory
const PID_FILE_NAME: &str = "devstack.pid";

/// Top-level configuration for one devstack run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Directory the children run in (defaults to the current directory)
    pub working_dir: Option<PathBuf>,

    /// Where the orchestrator records its own PID
    pub pid_file: Option<PathBuf>,

    /// Cache server started before everything else
    pub cache: CacheConfig,

    /// Dependency installer run before the services
    pub install: InstallConfig,

    /// Dashboard process
    pub ui: UiConfig,

    /// API server process
    pub api: ApiConfig,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            working_dir: None,
            pid_file: None,
            cache: CacheConfig::default(),
            install: InstallConfig::default(),
            ui: UiConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl LauncherConfig {
    /// Resolved PID file location
    pub fn pid_file_path(&self) -> PathBuf {
        self.pid_file
            .clone()
            .unwrap_or_else(|| super::default_config_dir().join(PID_FILE_NAME))
    }

    /// Reject configurations that cannot be launched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.enabled {
            if self.cache.process_name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "cache.process_name must not be empty".into(),
                ));
            }
            require_program("cache", &self.cache.program)?;
        }
        if self.install.enabled {
            require_program("install", &self.install.program)?;
        }
        require_program("ui", &self.ui.program)?;
        require_program("api", &self.api.program)?;
        require_port("ui", self.ui.port)?;
        require_port("api", self.api.port)?;
        if self.api.host.trim().is_empty() {
            return Err(ConfigError::Invalid("api.host must not be empty".into()));
        }
        Ok(())
    }
}

fn require_program(section: &str, program: &str) -> Result<(), ConfigError> {
    if program.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "{}.program must not be empty",
            section
        )));
    }
    Ok(())
}

fn require_port(section: &str, port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::Invalid(format!("{}.port must be non-zero", section)));
    }
    Ok(())
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (looked up on PATH)
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Create a command with no extra environment
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Cache server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Start the cache server if it is not running
    pub enabled: bool,

    /// Process name probed in the process table
    pub process_name: String,

    /// Program used to start the server
    pub program: String,

    /// Arguments (must make the server detach)
    pub args: Vec<String>,

    /// Extra environment variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_name: "redis-server".to_string(),
            program: "redis-server".to_string(),
            args: vec!["--daemonize".to_string(), "yes".to_string()],
            env: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Command line that starts the cache server
    pub fn command(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

/// What to do when the installer exits unsuccessfully
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallFailurePolicy {
    /// Log the failure and launch the services anyway
    #[default]
    Continue,
    /// Stop before launching anything
    Abort,
}

/// Dependency installer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Run the installer before launching
    pub enabled: bool,

    /// Installer program
    pub program: String,

    /// Installer arguments (including the manifest path)
    pub args: Vec<String>,

    /// Behaviour on a failed install
    pub on_failure: InstallFailurePolicy,

    /// Extra environment variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "pip".to_string(),
            args: vec![
                "install".to_string(),
                "-r".to_string(),
                "requirements.txt".to_string(),
            ],
            env: BTreeMap::new(),
            on_failure: InstallFailurePolicy::Continue,
        }
    }
}

impl InstallConfig {
    /// Command line that runs the installer
    pub fn command(&self) -> CommandSpec {
        CommandSpec {
            program: self.program.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

/// Dashboard process settings (bound by port only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Program that serves the dashboard
    pub program: String,

    /// Arguments placed before the port flag
    pub args: Vec<String>,

    /// Port the dashboard listens on
    pub port: u16,

    /// Flag that carries the port
    pub port_flag: String,

    /// Extra environment variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            program: "streamlit".to_string(),
            args: vec!["run".to_string(), "dashboard.py".to_string()],
            env: BTreeMap::new(),
            port: 8501,
            port_flag: "--server.port".to_string(),
        }
    }
}

impl UiConfig {
    /// Command line that starts the dashboard
    pub fn command(&self) -> CommandSpec {
        let mut args = self.args.clone();
        args.push(self.port_flag.clone());
        args.push(self.port.to_string());
        CommandSpec {
            program: self.program.clone(),
            args,
            env: self.env.clone(),
        }
    }

    /// Local address to probe for reachability
    pub fn probe_address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}

/// API server settings (bound by host and port)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Program that serves the API
    pub program: String,

    /// Arguments placed before the host and port flags
    pub args: Vec<String>,

    /// Interface to bind
    pub host: String,

    /// Flag that carries the host
    pub host_flag: String,

    /// Port to bind
    pub port: u16,

    /// Flag that carries the port
    pub port_flag: String,

    /// Extra environment variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            program: "uvicorn".to_string(),
            args: vec!["api.main:app".to_string()],
            env: BTreeMap::new(),
            host: "0.0.0.0".to_string(),
            host_flag: "--host".to_string(),
            port: 8000,
            port_flag: "--port".to_string(),
        }
    }
}

impl ApiConfig {
    /// Command line that starts the API server
    pub fn command(&self) -> CommandSpec {
        let mut args = self.args.clone();
        args.push(self.host_flag.clone());
        args.push(self.host.clone());
        args.push(self.port_flag.clone());
        args.push(self.port.to_string());
        CommandSpec {
            program: self.program.clone(),
            args,
            env: self.env.clone(),
        }
    }

    /// Bind address as configured
    pub fn bind_address(&self) -> String {
        match parse_ip(&self.host) {
            Some(ip) => SocketAddr::new(ip, self.port).to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    /// Address to probe for reachability; wildcard binds are probed on loopback
    ///
    /// IPv6 literals come out bracketed (`[::1]:8000`).
    pub fn probe_address(&self) -> String {
        match parse_ip(&self.host) {
            Some(IpAddr::V4(ip)) if ip.is_unspecified() => {
                SocketAddr::new(Ipv4Addr::LOCALHOST.into(), self.port).to_string()
            }
            Some(IpAddr::V6(ip)) if ip.is_unspecified() => {
                SocketAddr::new(Ipv6Addr::LOCALHOST.into(), self.port).to_string()
            }
            Some(ip) => SocketAddr::new(ip, self.port).to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

/// Parse an IP literal, accepting a bracketed IPv6 form
fn parse_ip(host: &str) -> Option<IpAddr> {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse().ok()
}
