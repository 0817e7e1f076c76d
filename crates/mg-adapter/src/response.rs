//! Response post-processing for generation-family output.
//!
//! Hosted models echo prompt markup and special tokens back in their
//! continuations. `clean_response` strips that markup and de-duplicates
//! repeated lines; `score_confidence` assigns a shape-based confidence to
//! the cleaned text. Both are pure functions.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// Angle-bracketed spans: special tokens and turn markers like </s>, <pad>.
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

// Runs of spaces/tabs. Line breaks survive so line de-duplication can work.
static RE_HSPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Strip prompt markup from raw model output.
///
/// In order: drop `<...>` spans, drop literal instruction markers,
/// collapse horizontal whitespace runs, then drop empty and exactly
/// duplicated lines (first occurrence kept, order preserved).
///
/// Idempotent: cleaning already-clean text changes nothing.
pub fn clean_response(raw: &str) -> String {
    let text = RE_TAG.replace_all(raw, "");
    let text = text
        .replace("[INST]", "")
        .replace("[/INST]", "")
        .replace("<start_of_turn>", "")
        .replace("<end_of_turn>", "");
    let text = RE_HSPACE.replace_all(&text, " ");

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if seen.insert(line) {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Score a generation-family response with a shape heuristic.
///
/// This is a proxy, not a calibrated probability; question-answering and
/// classification predictions carry the backend's native score instead.
/// Bounded in [0.0, 1.0] for any input.
pub fn score_confidence(response: &str) -> f64 {
    // Degenerate output scores zero outright.
    if response.trim().chars().count() < 3 {
        return 0.0;
    }

    let mut confidence: f64 = 0.7;

    let words = response.split_whitespace().count();
    if words < 3 {
        confidence -= 0.3;
    } else if words > 10 {
        confidence += 0.1;
    }

    if response.trim_end().ends_with(['.', '!', '?']) {
        confidence += 0.1;
    }

    let chars = response.chars().count();
    if chars < 10 {
        confidence -= 0.2;
    } else if chars > 1000 {
        confidence -= 0.1;
    }

    confidence.clamp(0.0, 1.0)
}
