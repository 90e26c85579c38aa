//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! A walk consults it before every sitemap fetch and every yielded URL, and uses the
//! `Sitemap:` directives it declares to seed the walk.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::RobotsRules;

use crate::config::ResolvedConfig;
use crate::WalkError;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Fetches and parses robots.txt for an origin
///
/// Any failure short of cancellation (transport error, timeout, non-200 status,
/// unreadable body) yields allow-all rules.
///
/// # Arguments
///
/// * `config` - Resolved walk configuration (client, user agent, timeout, sink)
/// * `origin` - The origin to fetch `/robots.txt` from
/// * `cancel` - The walk's cancellation token
///
/// # Returns
///
/// * `Ok(RobotsRules)` - Parsed rules, or allow-all on failure
/// * `Err(WalkError::Cancelled)` - The walk was cancelled while fetching
pub async fn fetch_robots(
    config: &ResolvedConfig,
    origin: &Url,
    cancel: &CancellationToken,
) -> Result<RobotsRules, WalkError> {
    let robots_url = match origin.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return Ok(RobotsRules::allow_all()),
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WalkError::Cancelled),
        outcome = download(config, &robots_url) => outcome,
    };

    match outcome {
        Ok(Some(body)) => {
            let rules = RobotsRules::parse(
                &body,
                &robots_url,
                &config.user_agent,
                config.diagnostics.as_ref(),
            );
            debug!(
                url = %robots_url,
                sitemaps = rules.declared_sitemaps().len(),
                "Loaded robots.txt"
            );
            Ok(rules)
        }
        Ok(None) => Ok(RobotsRules::allow_all()),
        Err(e) => {
            debug!(url = %robots_url, error = %e, "robots.txt unavailable, allowing all");
            Ok(RobotsRules::allow_all())
        }
    }
}

/// Downloads a robots.txt body; `None` for any status other than 200
async fn download(
    config: &ResolvedConfig,
    robots_url: &Url,
) -> Result<Option<String>, reqwest::Error> {
    let mut request = config
        .client
        .get(robots_url.clone())
        .header(USER_AGENT, config.user_agent.as_str());
    if let Some(timeout) = config.per_request_timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    if response.status() != StatusCode::OK {
        debug!(url = %robots_url, status = %response.status(), "robots.txt not found");
        return Ok(None);
    }

    response.text().await.map(Some)
}
