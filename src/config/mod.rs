//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, DatabaseConfig) and loading
//! - [`harness`]: Validation harness fixture configuration

mod harness;
mod types;

pub use harness::{CustomerFixtureConfig, HarnessConfig};
pub use types::{Config, ConfigError, DATABASE_PATH_ENV, DatabaseConfig};
