//! Configuration management for devstack

mod launcher;

pub use launcher::{
    ApiConfig, CacheConfig, CommandSpec, InstallConfig, InstallFailurePolicy, LauncherConfig,
    UiConfig,
};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Name of a project-local configuration file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "devstack.toml";

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devstack")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Find the configuration file to use when none was given explicitly
///
/// A `devstack.toml` in the current directory wins over the per-user file.
pub fn discover_config_path() -> Option<PathBuf> {
    let project = PathBuf::from(PROJECT_CONFIG_FILE);
    if project.exists() {
        return Some(project);
    }

    let user = default_config_path();
    user.exists().then_some(user)
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
        }
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Resolve the launcher configuration
///
/// An explicit path must exist and parse. A discovered file that fails to
/// parse is reported and replaced by the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<LauncherConfig, ConfigError> {
    if let Some(path) = explicit {
        let config: LauncherConfig = load_config(path)?;
        config.validate()?;
        return Ok(config);
    }

    match discover_config_path() {
        Some(path) => {
            let config = load_config::<LauncherConfig>(&path)
                .and_then(|config| config.validate().map(|()| config));
            Ok(config.unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", path, e);
                LauncherConfig::default()
            }))
        }
        None => {
            tracing::info!("Using default configuration");
            Ok(LauncherConfig::default())
        }
    }
}
