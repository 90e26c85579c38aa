//! Sitemap-Walker: a streaming sitemap discovery engine
//!
//! This crate discovers every URL listed in a website's sitemap tree (plain
//! sitemaps, sitemap indexes, nested indexes, gzip-compressed files) and hands
//! them to the caller one at a time. Memory stays flat regardless of document
//! size because documents are decoded incrementally as they arrive.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_walker::{Options, SitemapFetcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = SitemapFetcher::new(Options::default())?;
//! let cancel = CancellationToken::new();
//! fetcher
//!     .walk(&cancel, "https://example.com", |item| {
//!         println!("{}", item.location());
//!         Ok::<(), std::io::Error>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod item;
pub mod output;
pub mod robots;
pub mod url;
pub mod walker;

use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error returned by item callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal outcome of a failed walk
///
/// Every variant is a distinct signal. Callers classify failures with
/// [`WalkError::is_cancellation`], [`WalkError::is_limit`] and
/// [`WalkError::status`] rather than by inspecting messages.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidInput { url: String, reason: String },

    #[error("item callback is missing")]
    NilCallback,

    #[error("no sitemaps discovered for {url}")]
    NoSitemapsDiscovered { url: ::url::Url },

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus {
        url: ::url::Url,
        status: StatusCode,
    },

    #[error("sitemap parse failed for {url}: {source}")]
    SitemapParse {
        url: ::url::Url,
        #[source]
        source: quick_xml::Error,
    },

    #[error("max depth {limit} exceeded at {url}")]
    MaxDepthExceeded { limit: u32, url: ::url::Url },

    #[error("max sitemaps {limit} exceeded")]
    MaxSitemapsExceeded { limit: usize },

    #[error("max URLs {limit} exceeded")]
    MaxUrlsExceeded { limit: usize },

    #[error("item callback failed: {source}")]
    Callback {
        #[source]
        source: BoxError,
    },

    #[error("walk cancelled")]
    Cancelled,

    #[error("request timed out for {url}")]
    Timeout { url: ::url::Url },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: ::url::Url,
        #[source]
        source: reqwest::Error,
    },
}

impl WalkError {
    /// True for caller cancellation and per-request timeouts
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout { .. })
    }

    /// True for the three count/depth limits
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::MaxDepthExceeded { .. }
                | Self::MaxSitemapsExceeded { .. }
                | Self::MaxUrlsExceeded { .. }
        )
    }

    /// The HTTP status behind an `UnexpectedStatus` failure
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Empty location")]
    EmptyLocation,

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Result type alias for walk operations
pub type Result<T> = std::result::Result<T, WalkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Options, ResolvedConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use item::Item;
pub use walker::SitemapFetcher;
