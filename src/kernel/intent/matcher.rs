use similar::TextDiff;
use std::collections::BTreeSet;

use super::types::{Intent, IntentCatalog};

/// Longest trigger that appears verbatim in `text`.
///
/// Triggers are tried longest first so that "pon la radio clásica" is not
/// shadowed by "pon la radio".
pub fn exact_match<'a>(catalog: &'a IntentCatalog, text: &str) -> Option<(&'a str, &'a Intent)> {
    let lower = text.to_lowercase();
    let mut triggers: Vec<(&str, &Intent)> = catalog.triggers().collect();
    // Stable sort keeps catalog order among equal lengths.
    triggers.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
    triggers.into_iter().find(|(trigger, _)| lower.contains(trigger))
}

/// Best fuzzy trigger and its token-set score (0-100). No threshold applied.
pub fn best_fuzzy<'a>(catalog: &'a IntentCatalog, text: &str) -> Option<(&'a str, &'a Intent, u8)> {
    let mut best: Option<(&str, &Intent, u8)> = None;
    for (trigger, intent) in catalog.triggers() {
        let score = token_set_ratio(text, trigger);
        if best.map_or(true, |(_, _, s)| score > s) {
            best = Some((trigger, intent, score));
        }
    }
    best
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Character-level similarity, 0-100.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    let r = TextDiff::from_chars(a, b).ratio();
    (r * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Token-order-insensitive similarity, 0-100.
///
/// Compares the shared tokens against each side's full (sorted) token set;
/// a string whose tokens are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0;
    }

    let join = |set: Vec<&String>| set.into_iter().cloned().collect::<Vec<_>>().join(" ");
    let sect = join(ta.intersection(&tb).collect());
    let only_a = join(ta.difference(&tb).collect());
    let only_b = join(tb.difference(&ta).collect());

    if !sect.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100;
    }

    let combined = |rest: &str| {
        if sect.is_empty() {
            rest.to_string()
        } else {
            format!("{} {}", sect, rest)
        }
    };
    let full_a = combined(&only_a);
    let full_b = combined(&only_b);

    let mut best = ratio(&full_a, &full_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &full_a)).max(ratio(&sect, &full_b));
    }
    best
}
