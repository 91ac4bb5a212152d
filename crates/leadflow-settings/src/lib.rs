//! # leadflow-settings
//!
//! Two documents live under `~/.leadflow`:
//!
//! - `settings.json`: the operator's outreach preferences ([`Settings`]).
//!   Read once at startup, written only on an explicit save. Nothing in the
//!   pipeline mutates it.
//! - `config.json`: service wiring ([`ServiceConfig`]): where the agent
//!   gateway lives, which remote agents serve each stage, and where the API
//!   listens. Loaded as compiled defaults, deep-merged with the file, then
//!   `LEADFLOW_*` environment overrides.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, config_path, deep_merge, load_config, load_config_from_path,
    load_settings_from_path, save_settings_to_path, settings_path,
};
pub use types::*;
