//! HTTP fetcher implementation
//!
//! This module handles every sitemap request of a walk, including:
//! - Building the default HTTP client
//! - Honoring `429 Too Many Requests` with bounded, `Retry-After`-aware retries
//! - Applying the status policy (probe misses, non-success skipping)
//! - Error classification (cancellation, timeout, transport)

use crate::config::ResolvedConfig;
use crate::diagnostics::Diagnostic;
use crate::walker::transport::{decode_body, SitemapBody};
use crate::WalkError;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::io;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Delay used when `Retry-After` is absent or unusable
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on any single backoff
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Retries after the first `429`; a request is sent at most this many times plus one
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Builds the HTTP client used when the caller supplies none
///
/// The User-Agent is not baked into the client; every request sets it, so a
/// caller-supplied client sends it as well.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitemap_walker::walker::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::default())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one sitemap file
///
/// # Status Policy
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Return the decoded body |
/// | 429 | Wait per `Retry-After` (5s default, 30s cap), retry up to 3 times |
/// | 429 after the last retry | `UnexpectedStatus` |
/// | Other, non-success allowed | Diagnostic, `None` |
/// | 404 on a default-path probe | Diagnostic, `None` |
/// | Other | `UnexpectedStatus` |
/// | Transport failure | `Timeout` or `Http`, no retry |
///
/// # Arguments
///
/// * `config` - Resolved walk configuration
/// * `location` - The sitemap to fetch
/// * `allow_missing` - Whether a 404 is an expected probe miss
/// * `cancel` - The walk's cancellation token
///
/// # Returns
///
/// * `Ok(Some(SitemapBody))` - The body, gzip already unwrapped
/// * `Ok(None)` - The location was skipped
/// * `Err(WalkError)` - The walk must stop
pub async fn fetch_sitemap(
    config: &ResolvedConfig,
    location: &Url,
    allow_missing: bool,
    cancel: &CancellationToken,
) -> Result<Option<SitemapBody>, WalkError> {
    for attempt in 0..=MAX_RETRY_ATTEMPTS {
        let response = send(config, location, cancel).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after_delay(response.headers().get(RETRY_AFTER), Utc::now());
            drop(response);

            if attempt == MAX_RETRY_ATTEMPTS {
                break;
            }
            config.diagnostics.record(&Diagnostic::RateLimited {
                url: location.clone(),
                attempt: attempt + 1,
                delay,
            });
            sleep(delay, cancel).await?;
            continue;
        }

        if !status.is_success() {
            if config.allow_non_success {
                config.diagnostics.record(&Diagnostic::NonSuccessSkipped {
                    url: location.clone(),
                    status,
                });
                return Ok(None);
            }
            if allow_missing && status == StatusCode::NOT_FOUND {
                config.diagnostics.record(&Diagnostic::ProbeMissing {
                    url: location.clone(),
                });
                return Ok(None);
            }
            return Err(WalkError::UnexpectedStatus {
                url: location.clone(),
                status,
            });
        }

        debug!(url = %location, status = %status, "Fetched sitemap");
        let stream = Box::pin(response.bytes_stream());
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WalkError::Cancelled),
            body = decode_body(stream, body_error) => body,
        };
        return body
            .map(Some)
            .map_err(|source| request_failure(location, source));
    }

    Err(WalkError::UnexpectedStatus {
        url: location.clone(),
        status: StatusCode::TOO_MANY_REQUESTS,
    })
}

/// Sends a GET with the configured agent and timeout, racing cancellation
async fn send(
    config: &ResolvedConfig,
    location: &Url,
    cancel: &CancellationToken,
) -> Result<Response, WalkError> {
    if cancel.is_cancelled() {
        return Err(WalkError::Cancelled);
    }

    let mut request = config
        .client
        .get(location.clone())
        .header(USER_AGENT, config.user_agent.as_str());
    if let Some(timeout) = config.per_request_timeout {
        request = request.timeout(timeout);
    }

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WalkError::Cancelled),
        result = request.send() => result,
    };
    result.map_err(|source| request_failure(location, source))
}

fn request_failure(url: &Url, source: reqwest::Error) -> WalkError {
    if source.is_timeout() {
        WalkError::Timeout { url: url.clone() }
    } else {
        WalkError::Http {
            url: url.clone(),
            source,
        }
    }
}

/// Converts body stream failures for the XML reader, keeping timeouts recognizable
fn body_error(err: reqwest::Error) -> io::Error {
    let kind = if err.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, err)
}

/// Waits for `delay` unless the walk is cancelled first
async fn sleep(delay: Duration, cancel: &CancellationToken) -> Result<(), WalkError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WalkError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Computes the backoff for a 429 response
///
/// `Retry-After` may be a number of seconds or an HTTP-date. Missing, invalid,
/// non-positive, and past values fall back to [`DEFAULT_RETRY_DELAY`]; the
/// result never exceeds [`MAX_RETRY_DELAY`].
pub fn retry_after_delay(value: Option<&HeaderValue>, now: DateTime<Utc>) -> Duration {
    let Some(value) = value
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return DEFAULT_RETRY_DELAY;
    };

    let delay = match value.parse::<i64>() {
        Ok(seconds) => u64::try_from(seconds)
            .ok()
            .filter(|&s| s > 0)
            .map(Duration::from_secs),
        Err(_) => parse_http_date(value)
            .and_then(|at| (at - now).to_std().ok())
            .filter(|d| !d.is_zero()),
    };

    delay.unwrap_or(DEFAULT_RETRY_DELAY).min(MAX_RETRY_DELAY)
}

/// Parses an HTTP-date in RFC 1123, RFC 850, or asctime form
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
