//! Configuration module for Jobsift
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file at all) is a valid setup.
//!
//! # Example
//!
//! ```no_run
//! use jobsift::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("jobsift.toml")).unwrap();
//! println!("Crawler will emit at most {} jobs", config.crawler.max_jobs);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, OutputFormat, SeedEntry, UserAgentConfig,
    DEFAULT_SEARCH_URL, DEFAULT_SITE_DOMAIN,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_JOBS_LIMIT};
