// Category Index - distinct categories derived from the ledger
//
// Nothing here is stored: every call re-scans the current ledger, so the
// result always reflects the latest add/remove/load.

use crate::ledger::Ledger;
use std::collections::HashSet;

/// Distinct categories in first-occurrence order (top to bottom).
pub fn categories(ledger: &Ledger) -> Vec<String> {
    let mut seen = HashSet::new();
    ledger
        .all()
        .iter()
        .filter(|record| seen.insert(record.category()))
        .map(|record| record.category().to_string())
        .collect()
}

/// Same set as `categories`, sorted lexicographically.
pub fn sorted_categories(ledger: &Ledger) -> Vec<String> {
    let mut names = categories(ledger);
    names.sort();
    names
}

/// Pre-selection for a category picker: the first category, if any.
pub fn default_selection(categories: &[String]) -> Option<String> {
    categories.first().cloned()
}

/// Categories in first-occurrence order with how many records each has.
pub fn category_counts(ledger: &Ledger) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();

    for record in ledger.all() {
        match counts.iter_mut().find(|(name, _)| name == record.category()) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.category().to_string(), 1)),
        }
    }

    counts
}
