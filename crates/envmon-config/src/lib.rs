//! Configuration system for the envmon client.
//!
//! Provides TOML-based configuration with:
//! - Backend URL and request timeout (`[server]`)
//! - Session file location (`[session]`)
//! - Layering: defaults, then the user config file, then environment
//!   variables. Command-line flags are applied last by the binary.

pub mod config;
pub mod error;

pub use config::{
    ClientConfig, DEFAULT_SERVER_URL, ServerConfig, SessionConfig, load_config, load_config_file,
    save_config, xdg_config_dir, xdg_config_path, xdg_data_dir,
};
pub use error::{ConfigError, Result};
