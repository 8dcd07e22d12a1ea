//! Configuration module for Nav-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use nav_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Time budget: {}s", config.scheduler.time_budget_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClientConfig, Config, DelayRange, EmptyTablePolicy, ListingConfig, OutputConfig,
    SchedulerConfig, SectionEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
