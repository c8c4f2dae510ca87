//! Crawl-plan configuration
//!
//! This module handles loading, parsing, and validating TOML crawl plans:
//! engine options plus seed locations with their (possibly nested) rule
//! trees.
//!
//! # Example
//!
//! ```no_run
//! use gleaner::config::load_plan;
//! use std::path::Path;
//!
//! let plan = load_plan(Path::new("plan.toml")).unwrap();
//! println!("Crawling {} seeds", plan.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{EngineSection, Plan, RuleEntry, RuleKindEntry, SeedEntry};

// Re-export parser functions
pub use parser::{compute_plan_hash, load_plan, load_plan_with_hash};
