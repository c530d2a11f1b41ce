//! Extraction of structured drafts from free-form assistant text.
//!
//! The writer agent returns its drafts as loosely formatted blocks:
//!
//! ```text
//! **Draft 1: Hot Take**
//! Strategy: Bold
//! This is the body.
//! ---
//! Word count: 4
//! ```
//!
//! Every occurrence of a `Draft N:` header starts a new block, wherever it
//! appears. Blocks with a malformed header or an empty body are skipped; the
//! parser never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Strategy used when a block has no `Strategy:` line.
pub const DEFAULT_STRATEGY: &str = "Default";

static FIRST_DRAFT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}draft\s*1:").expect("valid draft marker pattern"));

static HEADER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*{0,2}draft[ \t]*\d+:").expect("valid header pattern"));

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\*{0,2}draft[ \t]*(\d+):[ \t]*([^*\n]+)").expect("valid header pattern")
});

static STRATEGY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^strategy:\s*(.*)$").expect("valid strategy pattern"));

static WORD_COUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^word\s*count:\s*(\d+)(?:\s*words?)?$").expect("valid word count pattern")
});

/// A draft block parsed out of assistant text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedDraft {
    pub title: String,
    pub strategy: String,
    pub content: String,
    pub word_count: u32,
}

/// Whether `text` contains at least one draft block.
///
/// Only the `Draft 1:` marker is checked, so this can be true while
/// [`parse_drafts`] still returns nothing (e.g. every body is empty).
pub fn has_drafts(text: &str) -> bool {
    FIRST_DRAFT_MARKER.is_match(text)
}

/// Parse every well-formed draft block in `text`, in order of appearance.
pub fn parse_drafts(text: &str) -> Vec<ParsedDraft> {
    let starts: Vec<usize> = HEADER_START.find_iter(text).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            parse_block(&text[start..end])
        })
        .collect()
}

/// Number of whitespace-delimited words in `text`.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

fn parse_block(block: &str) -> Option<ParsedDraft> {
    let header = HEADER.captures(block)?;
    let title = header[2].replace('*', "").trim().to_string();
    if title.is_empty() {
        return None;
    }

    // The rest of the header line (closing emphasis etc.) is not part of the body.
    let header_end = header.get(0).map(|m| m.end()).unwrap_or(0);
    let body = match block[header_end..].find('\n') {
        Some(newline) => &block[header_end + newline + 1..],
        None => "",
    };

    let mut strategy = None;
    let mut explicit_count = None;
    let mut saw_word_count = false;
    let mut kept = Vec::new();

    for line in body.lines() {
        let plain = line.replace('*', "");
        let plain = plain.trim();

        if strategy.is_none() {
            if let Some(caps) = STRATEGY_LINE.captures(plain) {
                strategy = Some(clean_strategy(&caps[1]));
                continue;
            }
        }

        if !saw_word_count {
            if let Some(caps) = WORD_COUNT_LINE.captures(plain) {
                saw_word_count = true;
                // A stated count of zero is meaningless; fall back to counting.
                explicit_count = caps[1].parse::<u32>().ok().filter(|n| *n > 0);
                continue;
            }
        }

        if is_separator(line.trim()) {
            continue;
        }

        kept.push(line);
    }

    let joined = kept.join("\n");
    let content = joined
        .trim()
        .lines()
        .map(|line| strip_quotes(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if content.is_empty() {
        return None;
    }

    let word_count = explicit_count.unwrap_or_else(|| count_words(&content));

    Some(ParsedDraft {
        title,
        strategy: strategy.unwrap_or_else(|| DEFAULT_STRATEGY.to_string()),
        content,
        word_count,
    })
}

fn clean_strategy(raw: &str) -> String {
    let cleaned = raw.replace(['*', '"'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        DEFAULT_STRATEGY.to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '-')
}

fn strip_quotes(line: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let line = line.strip_prefix(is_quote).unwrap_or(line);
    line.strip_suffix(is_quote).unwrap_or(line)
}
