//! Infrastructure adapters for configuration and console output.

pub mod config;
pub mod logging;
