use crate::config::validation::validate;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::url::UrlFilter;
use crate::ConfigResult;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Top-level layout of a TOML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub fetcher: Options,
}

/// Walk options as supplied by the caller
///
/// Every field is optional. `0` disables a limit and an empty pattern list
/// disables that side of the filter. Options are turned into an immutable
/// [`ResolvedConfig`] once, when the fetcher is built.
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// HTTP client to use instead of the default one
    #[serde(skip)]
    pub http_client: Option<Client>,

    /// Maximum sitemap index depth (0 = unlimited)
    pub max_depth: u32,

    /// Maximum number of sitemap files to fetch (0 = unlimited)
    pub max_sitemaps: usize,

    /// Maximum number of URLs to yield (0 = unlimited)
    pub max_urls: usize,

    /// Skip sitemaps answering with a non-2xx status instead of failing
    pub allow_non_success: bool,

    /// Do not fetch or honor robots.txt
    pub ignore_robots: bool,

    /// User-Agent header value; a browser-like default is used when unset
    pub user_agent: Option<String>,

    /// Timeout for one HTTP round trip, body included (zero = none)
    #[serde(rename = "per-request-timeout-ms", deserialize_with = "duration_from_millis")]
    pub per_request_timeout: Duration,

    /// Receiver for skip and retry events; defaults to tracing
    #[serde(skip)]
    pub diagnostics: Option<Arc<dyn DiagnosticSink>>,

    /// Regular expressions a page URL must match one of
    pub include: Vec<String>,

    /// Regular expressions a page URL must match none of
    pub exclude: Vec<String>,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("http_client", &self.http_client.is_some())
            .field("max_depth", &self.max_depth)
            .field("max_sitemaps", &self.max_sitemaps)
            .field("max_urls", &self.max_urls)
            .field("allow_non_success", &self.allow_non_success)
            .field("ignore_robots", &self.ignore_robots)
            .field("user_agent", &self.user_agent)
            .field("per_request_timeout", &self.per_request_timeout)
            .field("diagnostics", &self.diagnostics.is_some())
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl Options {
    /// Validates the options and fills in every default
    ///
    /// # Returns
    ///
    /// * `Ok(ResolvedConfig)` - A fully populated configuration
    /// * `Err(ConfigError)` - Validation failed or the default client could not be built
    pub fn resolve(self) -> ConfigResult<ResolvedConfig> {
        validate(&self)?;

        let filter = UrlFilter::from_patterns(&self.include, &self.exclude)?;
        let client = match self.http_client {
            Some(client) => client,
            None => crate::walker::build_http_client()?,
        };
        let user_agent = self
            .user_agent
            .map(|ua| ua.trim().to_string())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let per_request_timeout =
            (!self.per_request_timeout.is_zero()).then_some(self.per_request_timeout);
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn DiagnosticSink>);

        Ok(ResolvedConfig {
            client,
            max_depth: self.max_depth,
            max_sitemaps: self.max_sitemaps,
            max_urls: self.max_urls,
            allow_non_success: self.allow_non_success,
            ignore_robots: self.ignore_robots,
            user_agent,
            per_request_timeout,
            diagnostics,
            filter,
        })
    }
}

/// Fully populated, read-only walk configuration
#[derive(Clone)]
pub struct ResolvedConfig {
    pub client: Client,
    pub max_depth: u32,
    pub max_sitemaps: usize,
    pub max_urls: usize,
    pub allow_non_success: bool,
    pub ignore_robots: bool,
    pub user_agent: String,
    pub per_request_timeout: Option<Duration>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub filter: UrlFilter,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("max_depth", &self.max_depth)
            .field("max_sitemaps", &self.max_sitemaps)
            .field("max_urls", &self.max_urls)
            .field("allow_non_success", &self.allow_non_success)
            .field("ignore_robots", &self.ignore_robots)
            .field("user_agent", &self.user_agent)
            .field("per_request_timeout", &self.per_request_timeout)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
