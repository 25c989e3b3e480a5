//! Heading outline via memchr line scan, no markdown parser.
//! Find ATX heading lines outside fenced code, keep depth 1–4, slug each one.

pub mod fence;

use serde::{Deserialize, Serialize};

use crate::slug::slugify;
use fence::{indent_end, FenceEvent, FenceState};

/// Deepest ATX level ever reported. `#####` and deeper are not headings here.
pub const MAX_DEPTH: u8 = 4;

/// One heading found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
    /// Number of `#` marks, 1–4.
    pub depth: u8,
    pub text: String,
    /// Slug of `text`; may be empty.
    pub id: String,
    /// 1-based source line.
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineOptions {
    /// Headings deeper than this are dropped. Clamped into 1..=4.
    pub max_depth: u8,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

impl OutlineOptions {
    fn ceiling(self) -> usize {
        usize::from(self.max_depth.clamp(1, MAX_DEPTH))
    }
}

/// Full result of a scan: headings plus the counts the stats view needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub headings: Vec<HeadingRecord>,
    /// Fences opened, including an unterminated last one.
    pub code_blocks: u32,
    pub lines: u32,
}

/// Headings of `markdown` in document order, default depth ceiling.
pub fn extract_outline(markdown: &str) -> Vec<HeadingRecord> {
    extract_outline_with(markdown, &OutlineOptions::default())
}

pub fn extract_outline_with(markdown: &str, opts: &OutlineOptions) -> Vec<HeadingRecord> {
    scan(markdown, opts).headings
}

/// Single pass over the lines. Total: any input yields an outline, an
/// unterminated fence just swallows the rest of the document.
pub fn scan(markdown: &str, opts: &OutlineOptions) -> Outline {
    let buf = markdown.as_bytes();
    let ceiling = opts.ceiling();
    let mut outline = Outline::default();
    let mut fence = FenceState::default();
    let mut pos = 0;

    if buf.is_empty() {
        return outline;
    }

    while pos <= buf.len() {
        outline.lines += 1;

        let line_end = memchr::memchr(b'\n', &buf[pos..]).map_or(buf.len(), |i| pos + i);

        // \r\n → \n
        let content_end = if line_end > pos && buf[line_end - 1] == b'\r' {
            line_end - 1
        } else {
            line_end
        };
        let line = &markdown[pos..content_end];

        match fence.step(line) {
            FenceEvent::Open => outline.code_blocks += 1,
            FenceEvent::Close => {}
            FenceEvent::None if fence.is_inside() => {}
            FenceEvent::None => {
                if let Some((depth, text)) = parse_heading(line) {
                    if usize::from(depth) <= ceiling {
                        outline.headings.push(HeadingRecord {
                            depth,
                            id: slugify(text),
                            text: text.to_string(),
                            line: outline.lines,
                        });
                    }
                }
            }
        }

        pos = line_end + 1;
    }

    outline
}

/// Match `^\s{0,3}#{1,4}\s` and return (depth, trimmed text).
/// A closing `#` sequence stays part of the text.
fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let rest = &line[indent_end(line)?..];
    let level = rest.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > usize::from(MAX_DEPTH) {
        return None;
    }
    let sep = rest[level..].chars().next().filter(|c| c.is_whitespace())?;
    // `level` fits in u8: bounded by MAX_DEPTH above.
    Some((level as u8, rest[level + sep.len_utf8()..].trim()))
}
