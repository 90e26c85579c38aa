//! Non-fatal events recorded during a walk
//!
//! Skips, probe misses, retries and malformed entries never abort a walk.
//! They are reported to a [`DiagnosticSink`] so callers can observe them; the
//! default sink forwards them to `tracing` at debug level.

use reqwest::StatusCode;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A non-fatal event observed while walking
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// robots.txt disallows fetching a sitemap
    SitemapDisallowed { url: Url },

    /// robots.txt disallows a page URL listed in a sitemap
    UrlDisallowed { url: Url },

    /// A `<loc>` value in a `<url>` entry could not be resolved
    InvalidUrlLocation {
        value: String,
        sitemap: Url,
        reason: String,
    },

    /// A `<loc>` value in a `<sitemap>` entry could not be resolved
    InvalidSitemapLocation {
        value: String,
        sitemap: Url,
        reason: String,
    },

    /// A `Sitemap:` directive in robots.txt could not be parsed
    InvalidRobotsSitemap { value: String, robots: Url },

    /// A `<lastmod>` value matched none of the supported formats
    InvalidLastModified { value: String, url: Url },

    /// A `<priority>` value was not a number
    InvalidPriority { value: String, url: Url },

    /// A non-2xx response was skipped because non-success statuses are allowed
    NonSuccessSkipped { url: Url, status: StatusCode },

    /// A default sitemap location was not found
    ProbeMissing { url: Url },

    /// The server asked us to slow down; the fetch will be retried
    RateLimited {
        url: Url,
        attempt: u32,
        delay: Duration,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SitemapDisallowed { url } => write!(f, "robots.txt disallows sitemap {}", url),
            Self::UrlDisallowed { url } => write!(f, "robots.txt disallows URL {}", url),
            Self::InvalidUrlLocation {
                value,
                sitemap,
                reason,
            } => write!(f, "invalid URL {:?} in {}: {}", value, sitemap, reason),
            Self::InvalidSitemapLocation {
                value,
                sitemap,
                reason,
            } => write!(f, "invalid sitemap URL {:?} in {}: {}", value, sitemap, reason),
            Self::InvalidRobotsSitemap { value, robots } => {
                write!(f, "invalid sitemap URL {:?} in robots.txt {}", value, robots)
            }
            Self::InvalidLastModified { value, url } => {
                write!(f, "unparseable lastmod {:?} for {}", value, url)
            }
            Self::InvalidPriority { value, url } => {
                write!(f, "unparseable priority {:?} for {}", value, url)
            }
            Self::NonSuccessSkipped { url, status } => {
                write!(f, "non-200 status for {}: {}", url, status)
            }
            Self::ProbeMissing { url } => write!(f, "sitemap not found (probe) {}", url),
            Self::RateLimited {
                url,
                attempt,
                delay,
            } => write!(
                f,
                "received 429 for {} (attempt {}), retrying in {:?}",
                url, attempt, delay
            ),
        }
    }
}

/// Receiver for non-fatal walk events
///
/// Sinks are shared by every walk on a fetcher, so implementations must be
/// thread-safe.
pub trait DiagnosticSink: Send + Sync {
    /// Records one event
    fn record(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        tracing::debug!("{}", diagnostic);
    }
}

/// Keeps every diagnostic in memory
///
/// Useful in tests and for callers that want a post-walk report.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a snapshot of the recorded events
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        tracing::debug!("{}", diagnostic);
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic.clone());
        }
    }
}
