//! Storage module for configuration.

pub mod config;

pub use config::{AggregationSettings, ApiSettings, AppConfig, ConfigError, SessionBackend, SessionSettings};
