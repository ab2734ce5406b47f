//! Configuration Module
//!
//! Handles client configuration loading and validation.

pub mod loader;
pub mod settings;

pub use loader::{ConfigLoader, CONFIG_PATH_ENV};
pub use settings::{DiamondConfig, DEFAULT_SERVER_PORT, DEFAULT_TIMEOUT_SECS};
