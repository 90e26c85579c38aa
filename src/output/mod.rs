//! Output module for printing discovered items
//!
//! This module handles:
//! - Selecting an output format (plain lines or JSON lines)
//! - Writing items to any `std::io::Write` sink as they arrive

mod writer;

pub use writer::ItemWriter;

use clap::ValueEnum;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format item: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How each item is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One absolute URL per line
    #[default]
    Line,

    /// One JSON object per line with every parsed field
    #[value(name = "jsonl")]
    JsonLines,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "line"),
            Self::JsonLines => write!(f, "jsonl"),
        }
    }
}
