//! Gmail search query construction

use std::collections::HashSet;

/// Build the search selecting unprinted messages from allowed senders
///
/// Format: `has:attachment -label:<label> from:(a OR b) subject:(k1 OR k2)`.
/// Entries inside a clause are ORed, the clauses themselves are ANDed.
/// Repeated entries appear once, in first-seen order.
pub fn build_search_query(senders: &[String], subjects: &[String], printed_label: &str) -> String {
    let mut query_parts = vec![
        "has:attachment".to_string(),
        format!("-label:{}", label_search_name(printed_label)),
    ];

    if let Some(group) = or_group(senders) {
        query_parts.push(format!("from:({})", group));
    }
    if let Some(group) = or_group(subjects) {
        query_parts.push(format!("subject:({})", group));
    }

    query_parts.join(" ")
}

/// Gmail matches `label:` against the name with spaces turned into dashes
pub fn label_search_name(label: &str) -> String {
    label.trim().replace(' ', "-")
}

fn or_group(terms: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect();

    if unique.is_empty() {
        None
    } else {
        Some(unique.join(" OR "))
    }
}
