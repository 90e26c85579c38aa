//! Discovered sitemap entries handed to the caller

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use url::Url;

/// One `<url>` entry discovered during a walk
///
/// Items are immutable once built. The location is always absolute and
/// `source_sitemap` names the sitemap file the entry was read from (never an
/// index that merely pointed at that file).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    location: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    change_frequency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<f64>,
    source_sitemap: Url,
}

impl Item {
    pub(crate) fn new(
        location: Url,
        last_modified: Option<DateTime<FixedOffset>>,
        change_frequency: String,
        priority: Option<f64>,
        source_sitemap: Url,
    ) -> Self {
        Self {
            location,
            last_modified,
            change_frequency,
            priority,
            source_sitemap,
        }
    }

    /// The absolute page URL
    pub fn location(&self) -> &Url {
        &self.location
    }

    /// The parsed `<lastmod>` value, if present and parseable
    pub fn last_modified(&self) -> Option<DateTime<FixedOffset>> {
        self.last_modified
    }

    /// The trimmed `<changefreq>` text; empty when absent
    pub fn change_frequency(&self) -> &str {
        &self.change_frequency
    }

    /// The parsed `<priority>` value, if present and parseable
    pub fn priority(&self) -> Option<f64> {
        self.priority
    }

    /// The sitemap file that listed this entry
    pub fn source_sitemap(&self) -> &Url {
        &self.source_sitemap
    }
}
