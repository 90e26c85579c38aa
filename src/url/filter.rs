use crate::{ConfigError, ConfigResult};
use regex::Regex;
use url::Url;

/// Include/exclude pattern sets applied to every discovered page URL
///
/// Patterns are regular expressions matched anywhere in the serialized URL.
/// An empty include set includes everything; an empty exclude set excludes
/// nothing. Exclusion is evaluated after inclusion and always wins.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles pattern strings into a filter
    ///
    /// # Arguments
    ///
    /// * `include` - Patterns a URL must match at least one of
    /// * `exclude` - Patterns a URL must match none of
    ///
    /// # Returns
    ///
    /// * `Ok(UrlFilter)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn from_patterns<S: AsRef<str>>(include: &[S], exclude: &[S]) -> ConfigResult<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Returns true when no pattern is configured
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Checks a URL against the include and exclude sets
    ///
    /// # Examples
    ///
    /// ```
    /// use sitemap_walker::url::UrlFilter;
    /// use url::Url;
    ///
    /// let filter = UrlFilter::from_patterns(&["keep"], &["skip"]).unwrap();
    /// assert!(filter.allows(&Url::parse("https://e.com/keep").unwrap()));
    /// assert!(!filter.allows(&Url::parse("https://e.com/keep/skip").unwrap()));
    /// assert!(!filter.allows(&Url::parse("https://e.com/other").unwrap()));
    /// ```
    pub fn allows(&self, url: &Url) -> bool {
        let candidate = url.as_str();

        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(candidate)) {
            return false;
        }

        !self.exclude.iter().any(|re| re.is_match(candidate))
    }
}

/// Compiles each pattern, reporting the first failure with its source text
pub(crate) fn compile_all<S: AsRef<str>>(patterns: &[S]) -> ConfigResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let pattern = p.as_ref();
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
