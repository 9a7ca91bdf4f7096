//! Fenced code-block extraction from free-text engine replies.
//!
//! The engine's output format is not contractually guaranteed, so parsing
//! never fails: worst case the caller gets an empty list or the raw input
//! back and treats it as "could not extract".

use std::sync::LazyLock;

use regex::Regex;

/// Triple-backtick region with an optional language tag on the opening line.
/// Lazy so blocks are non-overlapping and returned in document order.
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)```(?:[\w-]+)?[ \t]*\r?\n(.*?)\r?\n?[ \t]*```").expect("valid fence regex")
});

/// Single-backtick inline span, used only as a fallback.
static INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("valid inline regex"));

/// Extract every fenced block from `reply`, in document order.
///
/// Each returned slice includes its own delimiters so the original block can
/// be redisplayed verbatim.
pub fn extract_blocks(reply: &str) -> Vec<&str> {
    FENCE_RE.find_iter(reply).map(|m| m.as_str()).collect()
}

/// Strip delimiters and language tag from a block, returning the interior
/// command text trimmed of leading/trailing blank lines.
///
/// Falls back to a single-backtick inline match, then to the trimmed input
/// as-is, when no triple fence is present.
pub fn command_text(block: &str) -> String {
    if let Some(caps) = FENCE_RE.captures(block) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = INLINE_RE.captures(block) {
        return caps[1].trim().to_string();
    }
    block.trim().to_string()
}
