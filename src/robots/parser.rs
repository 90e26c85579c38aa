//! Robots.txt parser implementation
//!
//! The body is tokenized once by the robotstxt crate. Allow/Disallow patterns
//! of the groups that apply to the configured agent are kept, along with every
//! `Sitemap:` directive, so checking a URL never re-reads the file.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::url::resolve_location;
use robotstxt::matcher::{LongestMatchRobotsMatchStrategy, RobotsMatchStrategy};
use robotstxt::{get_path_params_query, parse_robotstxt, RobotsParseHandler};
use url::Url;

const NO_MATCH: i32 = -1;

/// Allow and Disallow patterns of one applicable group
#[derive(Debug, Clone, Default)]
struct RuleGroup {
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl RuleGroup {
    fn add_allow(&mut self, pattern: &str) {
        self.allow.push(pattern.to_string());
        // "/dir/index.htm*" also allows "/dir/"
        if let Some(slash) = pattern.rfind('/') {
            if pattern[slash..].starts_with("/index.htm") {
                self.allow.push(format!("{}$", &pattern[..=slash]));
            }
        }
    }

    /// Longest matching Allow and Disallow pattern lengths for a path
    fn priorities(&self, path: &str) -> (i32, i32) {
        (longest_match(&self.allow, path), longest_match(&self.disallow, path))
    }

    /// `None` when no pattern of this group matched the path
    fn decide(&self, path: &str) -> Option<bool> {
        let (allow, disallow) = self.priorities(path);
        (allow > 0 || disallow > 0).then_some(disallow <= allow)
    }
}

fn longest_match(patterns: &[String], path: &str) -> i32 {
    let strategy = LongestMatchRobotsMatchStrategy;
    patterns
        .iter()
        .map(|pattern| strategy.match_disallow(path, pattern))
        .max()
        .unwrap_or(NO_MATCH)
}

/// Parse callbacks that sort rules into the agent's own group or the `*` group
struct RuleCollector<'a> {
    agent: &'a str,
    specific: Option<RuleGroup>,
    global: Option<RuleGroup>,
    in_specific: bool,
    in_global: bool,
    seen_separator: bool,
    sitemaps: Vec<String>,
}

impl<'a> RuleCollector<'a> {
    fn new(agent: &'a str) -> Self {
        Self {
            agent,
            specific: None,
            global: None,
            in_specific: false,
            in_global: false,
            seen_separator: false,
            sitemaps: Vec::new(),
        }
    }

    fn current_group(&mut self) -> Option<&mut RuleGroup> {
        if self.in_specific {
            self.specific.as_mut()
        } else if self.in_global {
            self.global.as_mut()
        } else {
            None
        }
    }
}

impl RobotsParseHandler for RuleCollector<'_> {
    fn handle_robots_start(&mut self) {
        self.specific = None;
        self.global = None;
        self.in_specific = false;
        self.in_global = false;
        self.seen_separator = false;
        self.sitemaps.clear();
    }

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        // Consecutive User-agent lines share one group
        if self.seen_separator {
            self.in_specific = false;
            self.in_global = false;
            self.seen_separator = false;
        }

        let is_global = user_agent.starts_with('*')
            && user_agent[1..].chars().next().map_or(true, char::is_whitespace);
        if is_global {
            self.in_global = true;
            self.global.get_or_insert_with(RuleGroup::default);
        } else if !self.agent.is_empty() && group_token(user_agent).eq_ignore_ascii_case(self.agent)
        {
            self.in_specific = true;
            self.specific.get_or_insert_with(RuleGroup::default);
        }
    }

    fn handle_allow(&mut self, _line_num: u32, value: &str) {
        if let Some(group) = self.current_group() {
            group.add_allow(value);
            self.seen_separator = true;
        }
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        if let Some(group) = self.current_group() {
            group.disallow.push(value.to_string());
            self.seen_separator = true;
        }
    }

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        self.seen_separator = true;
        self.sitemaps.push(value.to_string());
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {
        self.seen_separator = true;
    }
}

/// Parsed robots.txt policy for one origin
///
/// Without a group for the configured agent (its own token or `*`) every
/// URL is allowed. A group naming the agent replaces the `*` group entirely.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    specific: Option<RuleGroup>,
    global: Option<RuleGroup>,
    declared_sitemaps: Vec<Url>,
}

impl RobotsRules {
    /// Creates a permissive rule set with no declared sitemaps
    ///
    /// This is used when robots.txt cannot be fetched or is not a 200 response.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses a robots.txt body
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt body
    /// * `robots_url` - Where the body was fetched from; relative `Sitemap:` values resolve against it
    /// * `user_agent` - The configured User-Agent header value
    /// * `sink` - Receives a diagnostic for every unusable `Sitemap:` value
    pub fn parse(
        content: &str,
        robots_url: &Url,
        user_agent: &str,
        sink: &dyn DiagnosticSink,
    ) -> Self {
        let mut collector = RuleCollector::new(product_token(user_agent));
        parse_robotstxt(content, &mut collector);

        let declared_sitemaps = collector
            .sitemaps
            .into_iter()
            .filter_map(|value| match resolve_location(robots_url, &value) {
                Ok(url) => Some(url),
                Err(_) => {
                    sink.record(&Diagnostic::InvalidRobotsSitemap {
                        value,
                        robots: robots_url.clone(),
                    });
                    None
                }
            })
            .collect();

        Self {
            specific: collector.specific,
            global: collector.global,
            declared_sitemaps,
        }
    }

    /// Returns true when a group applies to the configured agent
    pub fn has_match_group(&self) -> bool {
        self.specific.is_some() || self.global.is_some()
    }

    /// Sitemap locations advertised by the file, in file order
    pub fn declared_sitemaps(&self) -> &[Url] {
        &self.declared_sitemaps
    }

    /// Checks whether the URL's path and query may be fetched
    ///
    /// The longest matching pattern wins; Allow wins a tie.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let path = get_path_params_query(url.as_str());
        if let Some(group) = &self.specific {
            return group.decide(&path).unwrap_or(true);
        }
        self.global
            .as_ref()
            .and_then(|group| group.decide(&path))
            .unwrap_or(true)
    }
}

/// Extracts the product token of a user agent ("Mozilla/5.0 (...)" becomes "Mozilla")
fn product_token(user_agent: &str) -> &str {
    user_agent
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("")
}

/// The matchable part of a `User-agent:` value: letters, `-` and `_`
fn group_token(value: &str) -> &str {
    let end = value
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(value.len());
    &value[..end]
}
