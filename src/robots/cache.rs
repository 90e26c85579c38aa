//! Robots.txt caching implementation
//!
//! One cache lives for the duration of a single walk. Each origin's
//! robots.txt is fetched at most once; failures are cached as allow-all.

use crate::config::ResolvedConfig;
use crate::robots::{fetch_robots, RobotsRules};
use crate::url::origin_of;
use crate::WalkError;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Per-walk robots.txt cache keyed by origin (scheme, host and port)
#[derive(Debug)]
pub struct RobotsCache<'a> {
    config: &'a ResolvedConfig,
    entries: HashMap<String, RobotsRules>,
}

impl<'a> RobotsCache<'a> {
    /// Creates an empty cache bound to a walk configuration
    pub fn new(config: &'a ResolvedConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Returns the rules governing a URL's origin, fetching them on first use
    ///
    /// # Arguments
    ///
    /// * `url` - Any absolute URL on the origin
    /// * `cancel` - The walk's cancellation token
    ///
    /// # Returns
    ///
    /// * `Ok(&RobotsRules)` - Cached or freshly fetched rules
    /// * `Err(WalkError::Cancelled)` - Cancelled while fetching
    pub async fn rules_for(
        &mut self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<&RobotsRules, WalkError> {
        let origin = origin_of(url);
        let key = origin.as_str().to_string();

        if !self.entries.contains_key(&key) {
            let rules = fetch_robots(self.config, &origin, cancel).await?;
            self.entries.insert(key.clone(), rules);
        }

        Ok(self
            .entries
            .entry(key)
            .or_insert_with(RobotsRules::allow_all))
    }

    /// Checks whether robots.txt allows fetching a URL
    ///
    /// Always true when robots handling is disabled.
    pub async fn is_allowed(
        &mut self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<bool, WalkError> {
        if self.config.ignore_robots {
            return Ok(true);
        }
        let rules = self.rules_for(url, cancel).await?;
        Ok(rules.is_allowed(url))
    }

    /// Number of origins cached so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
