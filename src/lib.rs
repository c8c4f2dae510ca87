//! Gleaner: a rule-driven web crawler engine
//!
//! Given seed locations and a declarative set of extraction rules, gleaner
//! fetches pages, extracts structured fields, follows discovered links, and
//! emits one record per terminal page through a caller-supplied sink.

pub mod config;
pub mod engine;
pub mod rules;

use thiserror::Error;

/// Main error type for gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Plan error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crawl-plan configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read plan file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid selector '{selector}' in rule '{rule}'")]
    InvalidSelector { rule: String, selector: String },
}

/// Document fetch errors. Workers log these and abandon the item; they
/// never abort the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Result type alias for gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for plan configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use engine::{Engine, Frontier, LogSink, RecordSink};
pub use rules::{EngineOptions, Rule, RuleKind, SelectorSpec, WorkItem};
