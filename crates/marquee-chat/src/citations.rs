//! Citation post-filtering.
//!
//! The generator is asked to cite with bracket-number markers. Only the
//! citations whose numbers actually appear in the prose are returned to
//! the caller; the rest were assembled but unused.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use marquee_core::Citation;
use regex::Regex;

/// Marker syntax is exactly `[k]` for a decimal k.
fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("Invalid citation marker regex"))
}

/// Keep the citations whose 1-based position appears as a bracket
/// marker in `prose`, in ascending position order, deduplicated.
/// Out-of-range markers are ignored, and an empty citation list always
/// filters to empty.
pub fn filter_citations(prose: &str, citations: &[Citation]) -> Vec<Citation> {
    if citations.is_empty() {
        return Vec::new();
    }

    let mut used: BTreeSet<usize> = BTreeSet::new();
    for capture in marker_regex().captures_iter(prose) {
        if let Ok(index) = capture[1].parse::<usize>() {
            used.insert(index);
        }
    }

    used.into_iter()
        .filter(|&k| k >= 1 && k <= citations.len())
        .map(|k| citations[k - 1].clone())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
