//! # Configuration
//!
//! Client configuration: API endpoint, credential location and logging.

pub mod client;

pub use client::{ClientConfig, ConfigError, LogFormat};
