//! clapp-api: reqwest-based provider client for the Cloudistics REST API.

pub mod client;
pub mod config;

pub use client::HttpProvider;
pub use config::{ClientConfig, ConfigError, DEFAULT_ENDPOINT};
