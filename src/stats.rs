use serde::Serialize;

use crate::outline::{scan, OutlineOptions};

/// Average silent reading speed used when nothing else is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Size and reading-time figures for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub words: usize,
    pub reading_minutes: usize,
    pub headings: usize,
    pub code_blocks: u32,
}

/// Whitespace-separated tokens. Empty or blank text counts zero.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes rounded up; a zero rate is treated as the default.
pub fn reading_minutes(words: usize, words_per_minute: u32) -> usize {
    let wpm = match words_per_minute {
        0 => DEFAULT_WORDS_PER_MINUTE,
        n => n,
    };
    words.div_ceil(wpm as usize)
}

pub fn document_stats(markdown: &str, opts: &OutlineOptions, words_per_minute: u32) -> DocumentStats {
    let outline = scan(markdown, opts);
    let words = word_count(markdown);
    DocumentStats {
        words,
        reading_minutes: reading_minutes(words, words_per_minute),
        headings: outline.headings.len(),
        code_blocks: outline.code_blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words() {
        assert_eq!(word_count("one two\tthree\n\nfour"), 4);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn minutes_round_up() {
        assert_eq!(reading_minutes(0, 200), 0);
        assert_eq!(reading_minutes(1, 200), 1);
        assert_eq!(reading_minutes(200, 200), 1);
        assert_eq!(reading_minutes(201, 200), 2);
        assert_eq!(reading_minutes(300, 100), 3);
    }

    #[test]
    fn zero_rate_uses_default() {
        assert_eq!(reading_minutes(400, 0), 2);
    }

    #[test]
    fn full_document() {
        let md = "# Title\nsome words here\n```\n# not\n```\n## Next\n";
        let s = document_stats(md, &OutlineOptions::default(), DEFAULT_WORDS_PER_MINUTE);
        assert_eq!(s.headings, 2);
        assert_eq!(s.code_blocks, 1);
        assert_eq!(s.words, 11);
        assert_eq!(s.reading_minutes, 1);
    }

    #[test]
    fn empty_document() {
        let s = document_stats("", &OutlineOptions::default(), 200);
        assert_eq!(
            s,
            DocumentStats {
                words: 0,
                reading_minutes: 0,
                headings: 0,
                code_blocks: 0
            }
        );
    }
}
