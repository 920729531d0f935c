//! Configuration module for Roster-Harvest
//!
//! Run parameters are compiled in as defaults; a TOML file may override any of
//! them. The loaded [`Config`] is immutable and passed explicitly to every
//! component that needs it.
//!
//! # Example
//!
//! ```no_run
//! use roster_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Batch size: {}", config.harvest.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DepartmentEntry, FacilityEntry, HarvestConfig, OutputConfig, SessionEngine,
    TargetConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, default_config, load_config, load_config_with_hash, parse_config,
};
