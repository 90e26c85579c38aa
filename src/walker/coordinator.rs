//! Walk coordinator - main traversal logic
//!
//! This module contains the walk loop that ties the other pieces together:
//! - Seeding the queue from the input URL, robots.txt, or default paths
//! - Draining the queue breadth-first with cycle detection
//! - Enforcing depth, sitemap and URL limits at their exact boundary
//! - Applying robots.txt and include/exclude policy to every URL
//! - Handing items to the caller's callback

use crate::config::ResolvedConfig;
use crate::diagnostics::Diagnostic;
use crate::item::Item;
use crate::robots::RobotsCache;
use crate::url::{default_sitemaps, is_likely_sitemap, normalize_input, resolve_location};
use crate::walker::fetcher::fetch_sitemap;
use crate::walker::parser::{
    parse_priority, parse_timestamp, DecodeError, SitemapEntry, SitemapReader, SitemapRecord,
    UrlEntry,
};
use crate::walker::queue::{SitemapTask, WalkQueue};
use crate::{BoxError, WalkError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

/// State of one walk call
///
/// Everything here is owned by a single `walk` invocation and dropped with it.
struct Walk<'a, F> {
    config: &'a ResolvedConfig,
    cancel: &'a CancellationToken,
    robots: RobotsCache<'a>,
    queue: WalkQueue,
    sitemap_count: usize,
    url_count: usize,
    on_item: F,
}

/// Runs a complete walk
///
/// # Arguments
///
/// * `config` - Resolved walk configuration
/// * `cancel` - Stops the walk at the next checkpoint when triggered
/// * `website` - A site URL or a direct sitemap URL
/// * `on_item` - Receives every accepted item, in discovery order
///
/// # Returns
///
/// * `Ok(())` - The queue drained
/// * `Err(WalkError)` - The walk stopped; items already delivered stay delivered
pub(crate) async fn run_walk<F, E>(
    config: &ResolvedConfig,
    cancel: &CancellationToken,
    website: &str,
    on_item: F,
) -> Result<(), WalkError>
where
    F: FnMut(Item) -> Result<(), E>,
    E: Into<BoxError>,
{
    let (input, origin) = normalize_input(website)?;

    let mut walk = Walk {
        config,
        cancel,
        robots: RobotsCache::new(config),
        queue: WalkQueue::default(),
        sitemap_count: 0,
        url_count: 0,
        on_item,
    };

    let seeds = walk.seed(&input, &origin).await?;
    if seeds.is_empty() {
        return Err(WalkError::NoSitemapsDiscovered { url: origin });
    }
    info!(url = %input, seeds = seeds.len(), "Starting sitemap walk");
    walk.queue = WalkQueue::new(seeds);

    walk.drain().await?;

    info!(
        url = %input,
        sitemaps = walk.sitemap_count,
        urls = walk.url_count,
        "Sitemap walk complete"
    );
    Ok(())
}

impl<'a, F, E> Walk<'a, F>
where
    F: FnMut(Item) -> Result<(), E>,
    E: Into<BoxError>,
{
    /// Picks the root tasks
    ///
    /// 1. A sitemap-looking input is the only root
    /// 2. Otherwise robots.txt `Sitemap:` directives (unless robots are ignored)
    /// 3. Otherwise the well-known default paths, as probes
    async fn seed(&mut self, input: &Url, origin: &Url) -> Result<Vec<SitemapTask>, WalkError> {
        if is_likely_sitemap(input) {
            return Ok(vec![SitemapTask::root(input.clone())]);
        }

        if !self.config.ignore_robots {
            let rules = self.robots.rules_for(origin, self.cancel).await?;
            if !rules.declared_sitemaps().is_empty() {
                debug!(
                    count = rules.declared_sitemaps().len(),
                    "Seeding from robots.txt sitemaps"
                );
                return Ok(rules
                    .declared_sitemaps()
                    .iter()
                    .cloned()
                    .map(SitemapTask::root)
                    .collect());
            }
        }

        debug!(origin = %origin, "Probing default sitemap locations");
        Ok(default_sitemaps(origin)
            .into_iter()
            .map(SitemapTask::probe)
            .collect())
    }

    /// Processes queued sitemaps until the queue is empty
    async fn drain(&mut self) -> Result<(), WalkError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(WalkError::Cancelled);
            }
            let Some(task) = self.queue.pop() else {
                return Ok(());
            };

            if self.config.max_depth > 0 && task.depth > self.config.max_depth {
                return Err(WalkError::MaxDepthExceeded {
                    limit: self.config.max_depth,
                    url: task.location,
                });
            }

            if !self.queue.mark_seen(&task.location) {
                trace!(url = %task.location, "Sitemap already visited");
                continue;
            }

            if !self.robots.is_allowed(&task.location, self.cancel).await? {
                self.config.diagnostics.record(&Diagnostic::SitemapDisallowed {
                    url: task.location.clone(),
                });
                continue;
            }

            if self.config.max_sitemaps > 0 && self.sitemap_count >= self.config.max_sitemaps {
                return Err(WalkError::MaxSitemapsExceeded {
                    limit: self.config.max_sitemaps,
                });
            }
            self.sitemap_count += 1;

            self.process(&task).await?;
        }
    }

    /// Fetches one sitemap and handles each of its records
    ///
    /// The body is dropped when this returns, on every path.
    async fn process(&mut self, task: &SitemapTask) -> Result<(), WalkError> {
        let Some(body) =
            fetch_sitemap(self.config, &task.location, task.allow_missing, self.cancel).await?
        else {
            return Ok(());
        };

        let mut reader = SitemapReader::new(body);
        loop {
            let record = match reader.next_record(self.cancel).await {
                Ok(Some(record)) => record,
                Ok(None) => return Ok(()),
                Err(DecodeError::Cancelled) => return Err(WalkError::Cancelled),
                Err(DecodeError::Timeout) => {
                    return Err(WalkError::Timeout {
                        url: task.location.clone(),
                    })
                }
                Err(DecodeError::Xml(source)) => {
                    return Err(WalkError::SitemapParse {
                        url: task.location.clone(),
                        source,
                    })
                }
            };

            match record {
                SitemapRecord::Url(entry) => self.handle_url(task, entry).await?,
                SitemapRecord::Sitemap(entry) => self.handle_sitemap(task, entry),
            }
        }
    }

    async fn handle_url(&mut self, task: &SitemapTask, entry: UrlEntry) -> Result<(), WalkError> {
        let location = match resolve_location(&task.location, &entry.loc) {
            Ok(location) => location,
            Err(e) => {
                self.config.diagnostics.record(&Diagnostic::InvalidUrlLocation {
                    value: entry.loc,
                    sitemap: task.location.clone(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        if !self.robots.is_allowed(&location, self.cancel).await? {
            self.config
                .diagnostics
                .record(&Diagnostic::UrlDisallowed { url: location });
            return Ok(());
        }

        if !self.config.filter.allows(&location) {
            trace!(url = %location, "URL filtered out");
            return Ok(());
        }

        if self.config.max_urls > 0 && self.url_count >= self.config.max_urls {
            return Err(WalkError::MaxUrlsExceeded {
                limit: self.config.max_urls,
            });
        }

        let last_modified = parse_timestamp(&entry.lastmod);
        if last_modified.is_none() && !entry.lastmod.trim().is_empty() {
            self.config.diagnostics.record(&Diagnostic::InvalidLastModified {
                value: entry.lastmod.clone(),
                url: location.clone(),
            });
        }
        let priority = parse_priority(&entry.priority);
        if priority.is_none() && !entry.priority.trim().is_empty() {
            self.config.diagnostics.record(&Diagnostic::InvalidPriority {
                value: entry.priority.clone(),
                url: location.clone(),
            });
        }

        let item = Item::new(
            location,
            last_modified,
            entry.changefreq.trim().to_string(),
            priority,
            task.location.clone(),
        );
        (self.on_item)(item).map_err(|e| WalkError::Callback { source: e.into() })?;
        self.url_count += 1;
        Ok(())
    }

    fn handle_sitemap(&mut self, task: &SitemapTask, entry: SitemapEntry) {
        match resolve_location(&task.location, &entry.loc) {
            Ok(location) => {
                trace!(url = %location, depth = task.depth + 1, "Queued nested sitemap");
                self.queue.push(task.child(location));
            }
            Err(e) => self.config.diagnostics.record(&Diagnostic::InvalidSitemapLocation {
                value: entry.loc,
                sitemap: task.location.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
