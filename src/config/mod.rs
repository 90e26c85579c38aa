//! Configuration module for Sitemap-Walker
//!
//! This module defines the walk options, loads them from TOML files, validates
//! them, and resolves them into the immutable configuration a fetcher runs with.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_walker::config::load_config;
//! use std::path::Path;
//!
//! let options = load_config(Path::new("walker.toml")).unwrap();
//! let config = options.resolve().unwrap();
//! println!("Walker will use max depth: {}", config.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ConfigFile, Options, ResolvedConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_config, parse_config};
