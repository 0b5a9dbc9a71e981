//! Configuration module for kb-crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use kb_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("kb-crawler.toml")).unwrap();
//! println!("Crawler will collect up to {} records", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ListingConfig, OutputConfig, RendererConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
