//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use ds_core::config::{self, LauncherConfig};

/// File the config commands act on: the explicit path, a discovered file,
/// or the per-user default location
fn target_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .or_else(config::discover_config_path)
        .unwrap_or_else(config::default_config_path)
}

/// Print the configuration file path in effect
pub fn config_path(config_path: Option<&Path>) {
    println!("{}", target_path(config_path).display());
}

/// Show current configuration
///
/// Prints the file as written, or the built-in defaults when no file exists.
pub fn config_show(config_path: Option<&Path>) -> Result<()> {
    let path = target_path(config_path);

    if !path.exists() {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing built-in defaults; run 'devstack config init' to create one");
        println!();
        println!("{}", toml::to_string_pretty(&LauncherConfig::default())?);
        return Ok(());
    }

    print_info(&format!("Configuration file: {:?}", path));
    println!();

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    println!("{}", content);

    Ok(())
}

/// Get a config value by dotted key (e.g. `api.port`)
///
/// Looks the key up in the effective configuration, so defaults are
/// visible even without a file.
pub fn config_get(config_path: Option<&Path>, key: &str) -> Result<()> {
    let launcher = config::resolve_config(config_path).context("Failed to load configuration")?;
    let root = toml::Value::try_from(&launcher).context("Failed to serialize configuration")?;

    let Some(value) = lookup(&root, key) else {
        print_error(&format!("Key not found: {}", key));
        anyhow::bail!("Unknown configuration key '{}'", key);
    };

    match value {
        toml::Value::String(s) => println!("{}", s),
        toml::Value::Integer(i) => println!("{}", i),
        toml::Value::Float(f) => println!("{}", f),
        toml::Value::Boolean(b) => println!("{}", b),
        toml::Value::Array(a) => {
            for item in a {
                match item {
                    toml::Value::String(s) => println!("{}", s),
                    other => println!("{}", other),
                }
            }
        }
        toml::Value::Table(_) => {
            println!("{}", toml::to_string_pretty(value)?);
        }
        toml::Value::Datetime(d) => println!("{}", d),
    }

    Ok(())
}

/// Navigate a dotted key path through nested tables
fn lookup<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(root, |current, part| current.as_table()?.get(part))
}

/// Write the default configuration
pub fn config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        anyhow::bail!("Refusing to overwrite {:?}", path);
    }

    config::save_config(&path, &LauncherConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}
