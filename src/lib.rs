//! Fence-aware Markdown heading outlines.
//!
//! [`extract_outline`] turns a document into a flat list of ATX headings
//! (depth 1–4) with slug ids. Everything else here sits around it: unique
//! anchors for a table of contents, reading-time stats, file input, a CLI and
//! a stdio MCP server.
//!
//! ```
//! let headings = mdoutline::extract_outline("# Intro\n```\n# not a heading\n```\n## Usage");
//! assert_eq!(headings.len(), 2);
//! assert_eq!(headings[1].id, "usage");
//! ```

pub mod anchors;
pub mod config;
pub mod error;
pub mod mcp;
pub mod outline;
pub mod read;
pub mod slug;
pub mod stats;
pub mod toc;

pub use anchors::{assign_anchors, TocEntry};
pub use error::{OutlineError, Result};
pub use outline::{extract_outline, extract_outline_with, HeadingRecord, OutlineOptions};
pub use slug::slugify;
pub use toc::TocFormat;

/// Table-of-contents entries for `headings`: unique anchors, or the raw
/// slugs when `raw_ids` is set.
pub fn toc_entries(headings: &[HeadingRecord], raw_ids: bool) -> Vec<TocEntry> {
    if raw_ids {
        headings.iter().map(TocEntry::raw).collect()
    } else {
        assign_anchors(headings)
    }
}
