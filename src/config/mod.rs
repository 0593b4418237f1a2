// src/config/mod.rs

//! Observer configuration.
//!
//! Responsibilities:
//! - Define the validated [`ObserverConfiguration`] and its builder, plus the
//!   TOML-backed file model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate settings and parse duration strings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ObserverConfiguration, ObserverConfigurationBuilder, ObserverSection,
    RawConfigFile, ResponderSection, DEFAULT_DEBOUNCE, DEFAULT_POLL_INTERVAL,
    DEFAULT_RESPONDER_TIMEOUT,
};
pub use validate::parse_duration;
