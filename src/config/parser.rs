use crate::config::types::{ConfigFile, Options};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads walk options from a TOML configuration file
///
/// The file holds a single `[fetcher]` table with kebab-case keys:
///
/// ```toml
/// [fetcher]
/// max-depth = 3
/// max-urls = 10000
/// ignore-robots = false
/// user-agent = "MyBot/1.0"
/// per-request-timeout-ms = 5000
/// include = ["/blog/"]
/// exclude = ["\\.pdf$"]
/// ```
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Options)` - Successfully loaded and validated options
/// * `Err(ConfigError)` - Failed to load, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitemap_walker::config::load_config;
///
/// let options = load_config(Path::new("walker.toml")).unwrap();
/// println!("Max depth: {}", options.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Options, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates options from TOML text
pub fn parse_config(content: &str) -> Result<Options, ConfigError> {
    let file: ConfigFile = toml::from_str(content)?;
    validate(&file.fetcher)?;
    Ok(file.fetcher)
}
