//! Breadth-first sitemap queue
//!
//! Holds the locations still to visit and the canonical keys of those already
//! dequeued. Both live for a single walk.

use crate::url::canonical_key;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A sitemap location waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapTask {
    /// Absolute location of the sitemap file
    pub location: Url,

    /// Number of index hops from a root (roots are 0)
    pub depth: u32,

    /// A 404 is an expected miss (well-known default paths only)
    pub allow_missing: bool,
}

impl SitemapTask {
    /// A root location the walk must be able to fetch
    pub fn root(location: Url) -> Self {
        Self {
            location,
            depth: 0,
            allow_missing: false,
        }
    }

    /// A well-known default location that may not exist
    pub fn probe(location: Url) -> Self {
        Self {
            location,
            depth: 0,
            allow_missing: true,
        }
    }

    /// A sitemap listed by this task's index document
    pub fn child(&self, location: Url) -> Self {
        Self {
            location,
            depth: self.depth + 1,
            allow_missing: false,
        }
    }
}

/// FIFO of pending tasks plus the seen set
#[derive(Debug, Default)]
pub struct WalkQueue {
    pending: VecDeque<SitemapTask>,
    seen: HashSet<String>,
}

impl WalkQueue {
    /// Creates a queue holding the seed tasks in order
    pub fn new(seeds: impl IntoIterator<Item = SitemapTask>) -> Self {
        Self {
            pending: seeds.into_iter().collect(),
            seen: HashSet::new(),
        }
    }

    pub fn push(&mut self, task: SitemapTask) {
        self.pending.push_back(task);
    }

    pub fn pop(&mut self) -> Option<SitemapTask> {
        self.pending.pop_front()
    }

    /// Records a location as visited
    ///
    /// Returns `false` when its canonical key was already seen.
    pub fn mark_seen(&mut self, location: &Url) -> bool {
        self.seen.insert(canonical_key(location))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct locations dequeued so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
