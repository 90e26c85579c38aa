//! Walker module for sitemap discovery and streaming
//!
//! This module contains the core walking logic, including:
//! - HTTP fetching with 429 retry and backoff
//! - Transparent gzip body decoding
//! - Incremental sitemap XML decoding
//! - The breadth-first walk over sitemap indexes

mod coordinator;
mod fetcher;
mod parser;
mod queue;
mod transport;

pub use fetcher::{
    build_http_client, retry_after_delay, DEFAULT_RETRY_DELAY, MAX_RETRY_ATTEMPTS,
    MAX_RETRY_DELAY,
};
pub use parser::{
    parse_priority, parse_timestamp, DecodeError, SitemapEntry, SitemapReader, SitemapRecord,
    UrlEntry,
};
pub use queue::{SitemapTask, WalkQueue};
pub use transport::SitemapBody;

use crate::config::{Options, ResolvedConfig};
use crate::item::Item;
use crate::{BoxError, ConfigResult, WalkError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Streams every URL of a website's sitemap tree
///
/// A fetcher holds only its resolved configuration, so it is cheap to clone
/// and can run any number of concurrent walks. Each walk owns its queue, seen
/// set, robots cache and counters.
///
/// # Example
///
/// ```no_run
/// use sitemap_walker::{Options, SitemapFetcher};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = SitemapFetcher::new(Options {
///     max_urls: 100,
///     ..Options::default()
/// })?;
///
/// let mut urls = Vec::new();
/// fetcher
///     .walk(&CancellationToken::new(), "example.com", |item| {
///         urls.push(item.location().clone());
///         Ok::<(), std::io::Error>(())
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SitemapFetcher {
    config: Arc<ResolvedConfig>,
}

impl SitemapFetcher {
    /// Creates a fetcher, validating the options and filling in defaults
    ///
    /// # Returns
    ///
    /// * `Ok(SitemapFetcher)` - Ready to walk
    /// * `Err(ConfigError)` - Invalid options or the default client failed to build
    pub fn new(options: Options) -> ConfigResult<Self> {
        Ok(Self::from_config(options.resolve()?))
    }

    /// Creates a fetcher from an already resolved configuration
    pub fn from_config(config: ResolvedConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration every walk of this fetcher runs with
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Walks the sitemap tree of `website`, calling `on_item` for every accepted URL
    ///
    /// `website` is either a site (robots.txt and default locations are used to
    /// find sitemaps) or a direct sitemap URL ending in `.xml` or `.xml.gz`.
    /// A missing scheme defaults to `https`.
    ///
    /// Returning an error from `on_item` stops the walk with
    /// [`WalkError::Callback`].
    ///
    /// # Arguments
    ///
    /// * `cancel` - Stops the walk at the next checkpoint when triggered
    /// * `website` - Site or sitemap URL
    /// * `on_item` - Receives items in discovery order
    pub async fn walk<F, E>(
        &self,
        cancel: &CancellationToken,
        website: &str,
        on_item: F,
    ) -> Result<(), WalkError>
    where
        F: FnMut(Item) -> Result<(), E>,
        E: Into<BoxError>,
    {
        coordinator::run_walk(&self.config, cancel, website, on_item).await
    }

    /// Like [`walk`](Self::walk) for callers holding an optional callback
    ///
    /// A missing callback fails with [`WalkError::NilCallback`] before any
    /// request is made.
    pub async fn walk_with<F, E>(
        &self,
        cancel: &CancellationToken,
        website: &str,
        on_item: Option<F>,
    ) -> Result<(), WalkError>
    where
        F: FnMut(Item) -> Result<(), E>,
        E: Into<BoxError>,
    {
        let Some(on_item) = on_item else {
            return Err(WalkError::NilCallback);
        };
        self.walk(cancel, website, on_item).await
    }
}
