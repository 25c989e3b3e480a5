use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::anchors::TocEntry;
use crate::stats::DocumentStats;

const MAX_TEXT_WIDTH: usize = 80;

/// Output shape for a rendered table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TocFormat {
    /// `[line] text`, indented by depth
    #[default]
    Text,
    /// Nested bullet list of fragment links
    Markdown,
    /// Entries as a JSON array
    Json,
}

impl TocFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render(entries: &[TocEntry], format: TocFormat) -> String {
    match format {
        TocFormat::Text => render_text(entries),
        TocFormat::Markdown => render_markdown(entries),
        TocFormat::Json => {
            serde_json::to_string_pretty(entries).unwrap_or_else(|_| String::from("[]"))
        }
    }
}

/// `[12]   Sub heading`: two spaces of indent per level below 1.
fn render_text(entries: &[TocEntry]) -> String {
    let mut out = String::new();
    for (i, e) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let indent = "  ".repeat(usize::from(e.depth.saturating_sub(1)));
        let text = if e.text.len() > MAX_TEXT_WIDTH {
            format!("{}...", truncate_str(&e.text, MAX_TEXT_WIDTH - 3))
        } else {
            e.text.clone()
        };
        let _ = write!(out, "[{}] {indent}{text}", e.line);
    }
    out
}

/// `- [Text](#anchor)`, nested relative to the shallowest heading present.
fn render_markdown(entries: &[TocEntry]) -> String {
    let Some(top) = entries.iter().map(|e| e.depth).min() else {
        return String::new();
    };
    let mut out = String::new();
    for e in entries {
        let indent = "  ".repeat(usize::from(e.depth - top));
        let _ = writeln!(out, "{indent}- [{}](#{})", escape_link_text(&e.text), e.anchor);
    }
    out.pop();
    out
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Cut to at most `max` bytes without splitting a character.
pub fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Header line per document:
/// `# docs/eip-1559.md (12 headings, ~4 min read)`
pub fn document_header(path: &Path, stats: &DocumentStats) -> String {
    let headings = match stats.headings {
        1 => "1 heading".to_string(),
        n => format!("{n} headings"),
    };
    format!(
        "# {} ({headings}, ~{} min read)",
        path.display(),
        stats.reading_minutes
    )
}

/// Trailing stats block for `--stats`.
pub fn stats_footer(stats: &DocumentStats) -> String {
    format!(
        "({} words, {} code blocks, ~{} min read)",
        stats.words, stats.code_blocks, stats.reading_minutes
    )
}
