//! URL handling module for Sitemap-Walker
//!
//! This module provides input normalization, `<loc>` resolution, dedup keys,
//! sitemap location discovery helpers, and include/exclude filtering.

mod filter;
mod normalize;

pub use filter::UrlFilter;
pub use normalize::{
    canonical_key, default_sitemaps, is_likely_sitemap, normalize_input, origin_of,
    resolve_location,
};

pub(crate) use filter::compile_all;
