use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{Block, Segment};
use crate::notion::types::RichText;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

const WORDS_PER_MINUTE: usize = 200;

/// Explicit slug when given, otherwise one derived from the title.
pub fn compute_slug(title: &str, explicit: &str) -> String {
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    slugify(title)
}

/// Lowercase, keep `[a-z0-9]`, join words with single hyphens.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(lower.trim(), "");
    let hyphenated = WHITESPACE_RE.replace_all(&stripped, "-");
    let collapsed = HYPHENS_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Minutes at 200 words per minute, rounded half up, at least 1.
pub fn estimate_reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    let minutes = (words + WORDS_PER_MINUTE / 2) / WORDS_PER_MINUTE;
    minutes.max(1) as u32
}

pub fn plain_text(rich: &[RichText]) -> String {
    rich.iter().map(|rt| rt.plain_text.as_str()).collect()
}

pub fn segments(rich: &[RichText]) -> Vec<Segment> {
    rich.iter()
        .map(|rt| Segment {
            text: rt.plain_text.clone(),
            href: rt.href.clone().filter(|h| !h.is_empty()),
            annotations: rt.annotations.clone().unwrap_or_default(),
        })
        .collect()
}

/// Readable text of a post body; image captions don't count.
pub fn body_text(blocks: &[Block]) -> String {
    let mut text = String::new();
    for block in blocks {
        let Some(rich) = block.rich_text() else {
            continue;
        };
        let line: Vec<&str> = rich.iter().map(|s| s.text.as_str()).collect();
        text.push_str(&line.join(" "));
        text.push(' ');
    }
    text.trim().to_string()
}
