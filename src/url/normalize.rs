use crate::{UrlError, WalkError};
use url::Url;

/// Well-known sitemap paths probed when robots.txt declares none
const DEFAULT_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap.xml.gz",
    "/sitemap_index.xml.gz",
    "/sitemap-index.xml.gz",
];

/// Normalizes the walk input into the input URL and its origin
///
/// # Normalization Steps
///
/// 1. Default a missing scheme to `https`
/// 2. Reject URLs without a host
/// 3. Remove the fragment
/// 4. Derive the origin (scheme, host and port, root path)
///
/// # Arguments
///
/// * `raw` - The website or sitemap URL as supplied by the caller
///
/// # Returns
///
/// * `Ok((input, origin))` - The normalized input and its origin
/// * `Err(WalkError::InvalidInput)` - The input cannot be parsed or has no host
///
/// # Examples
///
/// ```
/// use sitemap_walker::url::normalize_input;
///
/// let (input, origin) = normalize_input("example.com/blog#top").unwrap();
/// assert_eq!(input.as_str(), "https://example.com/blog");
/// assert_eq!(origin.as_str(), "https://example.com/");
/// ```
pub fn normalize_input(raw: &str) -> Result<(Url, Url), WalkError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| WalkError::InvalidInput {
        url: raw.to_string(),
        reason,
    };

    let with_https = || Url::parse(&format!("https://{}", trimmed.trim_start_matches("//")));
    let parsed = match Url::parse(trimmed) {
        Ok(url) if is_host_and_port(&url) => with_https(),
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => with_https(),
        Err(e) => Err(e),
    };
    let mut input = parsed.map_err(|e| invalid(e.to_string()))?;

    if !matches!(input.scheme(), "http" | "https") {
        return Err(invalid(
            UrlError::UnsupportedScheme(input.scheme().to_string()).to_string(),
        ));
    }

    if input.host_str().map_or(true, str::is_empty) {
        return Err(invalid(UrlError::MissingHost.to_string()));
    }

    input.set_fragment(None);
    let origin = origin_of(&input);
    Ok((input, origin))
}

/// `example.com:8080/path` parses with `example.com` as its scheme
fn is_host_and_port(url: &Url) -> bool {
    url.cannot_be_a_base()
        && url
            .path()
            .split(['/', '?', '#'])
            .next()
            .map_or(false, |port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

/// Resolves a `<loc>` value against the sitemap that contained it
///
/// Absolute values are kept as-is; relative values follow RFC 3986 reference
/// resolution against `base`. The fragment is always removed.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemap_walker::url::resolve_location;
///
/// let base = Url::parse("https://example.com/a/sitemap.xml").unwrap();
/// let url = resolve_location(&base, "  page  ").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/a/page");
/// ```
pub fn resolve_location(base: &Url, raw_loc: &str) -> Result<Url, UrlError> {
    let trimmed = raw_loc.trim();
    if trimmed.is_empty() {
        return Err(UrlError::EmptyLocation);
    }

    let mut resolved = match Url::parse(trimmed) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(trimmed)?,
        Err(e) => return Err(e.into()),
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(resolved.scheme().to_string()));
    }
    resolved.set_fragment(None);
    Ok(resolved)
}

/// Serializes a URL without its fragment, for use as a dedup key
pub fn canonical_key(url: &Url) -> String {
    if url.fragment().is_none() {
        return url.as_str().to_string();
    }
    let mut clone = url.clone();
    clone.set_fragment(None);
    clone.into()
}

/// Returns the origin (scheme, host, port) of a URL with a root path
pub fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    // Only fails for URLs that cannot carry credentials, which have none to clear
    let _ = origin.set_username("");
    let _ = origin.set_password(None);
    origin
}

/// Checks whether a URL points directly at a sitemap file
///
/// A URL is treated as a sitemap when its path ends in `.xml` or `.xml.gz`,
/// compared case-insensitively.
pub fn is_likely_sitemap(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}

/// Lists the well-known sitemap locations for an origin, in probe order
pub fn default_sitemaps(origin: &Url) -> Vec<Url> {
    DEFAULT_SITEMAP_PATHS
        .iter()
        .filter_map(|path| origin.join(path).ok())
        .collect()
}
