//! CLI command implementations

mod config;
mod status;
mod stop;
mod up;

pub use config::{config_get, config_init, config_path, config_show};
pub use status::status_command;
pub use stop::stop_command;
pub use up::{up_command, UpOverrides};
