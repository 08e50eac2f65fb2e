//! Configuration module for datachat.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, DemoSettings, LineageSettings, QuerySettings, Settings, SettingsError,
};
