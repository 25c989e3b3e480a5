//! Unique link targets for a rendered table of contents.
//!
//! The extractor reports raw slugs, duplicates and empties included. This pass
//! runs on the caller side and makes every anchor usable as a fragment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::outline::HeadingRecord;

/// A heading with an anchor that is unique within its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub depth: u8,
    pub text: String,
    pub anchor: String,
    pub line: u32,
}

impl TocEntry {
    /// Entry that keeps the raw slug as anchor, no uniqueness pass.
    pub fn raw(h: &HeadingRecord) -> Self {
        Self {
            depth: h.depth,
            text: h.text.clone(),
            anchor: h.id.clone(),
            line: h.line,
        }
    }
}

/// Assign unique anchors in document order.
///
/// Empty ids become `heading-<index>` (0-based position in `headings`).
/// A repeated id keeps its first use; later ones get `-2`, `-3`, ...
/// skipping any candidate already taken.
pub fn assign_anchors(headings: &[HeadingRecord]) -> Vec<TocEntry> {
    let mut taken: HashSet<String> = HashSet::with_capacity(headings.len());
    let mut entries = Vec::with_capacity(headings.len());

    for (index, h) in headings.iter().enumerate() {
        let base = if h.id.is_empty() {
            format!("heading-{index}")
        } else {
            h.id.clone()
        };

        let mut anchor = base.clone();
        let mut n = 2u32;
        while taken.contains(&anchor) {
            anchor = format!("{base}-{n}");
            n += 1;
        }
        taken.insert(anchor.clone());

        entries.push(TocEntry {
            depth: h.depth,
            text: h.text.clone(),
            anchor,
            line: h.line,
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::extract_outline;

    fn anchors(md: &str) -> Vec<String> {
        assign_anchors(&extract_outline(md))
            .into_iter()
            .map(|e| e.anchor)
            .collect()
    }

    #[test]
    fn unique_ids_untouched() {
        assert_eq!(anchors("# One\n## Two"), ["one", "two"]);
    }

    #[test]
    fn duplicates_get_counters() {
        assert_eq!(anchors("# A\n# A\n## A"), ["a", "a-2", "a-3"]);
    }

    #[test]
    fn counter_skips_literal_collision() {
        assert_eq!(anchors("# A\n# A-2\n# A"), ["a", "a-2", "a-3"]);
    }

    #[test]
    fn empty_ids_fall_back_to_position() {
        assert_eq!(anchors("# Intro\n## !!!\n## 🚀"), ["intro", "heading-1", "heading-2"]);
    }

    #[test]
    fn fallback_collision_with_real_heading() {
        assert_eq!(anchors("# Heading 1\n# ???"), ["heading-1", "heading-1-2"]);
    }

    #[test]
    fn keeps_order_and_fields() {
        let h = extract_outline("# X\n\n### Y");
        let e = assign_anchors(&h);
        assert_eq!(e.len(), 2);
        assert_eq!(e[1].depth, 3);
        assert_eq!(e[1].text, "Y");
        assert_eq!(e[1].line, 3);
    }

    #[test]
    fn raw_keeps_slug() {
        let h = extract_outline("# ???");
        assert_eq!(TocEntry::raw(&h[0]).anchor, "");
    }
}
