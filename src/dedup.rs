use std::collections::HashSet;

use crate::models::ProductRecord;

/// Trimmed names this short are adapter noise (placeholder rows,
/// truncated cells) and are filtered out.
pub const MIN_NAME_CHARS: usize = 5;

/// Merge `incoming` into `existing`, keeping the first occurrence of
/// each identity key and preserving order. Records whose trimmed name
/// has `MIN_NAME_CHARS` characters or fewer are filtered from both
/// streams, which keeps the operation idempotent:
/// `dedupe(&dedupe(x, []), y) == dedupe(x, y)`.
///
/// O(n) over a set of seen keys.
pub fn dedupe(existing: &[ProductRecord], incoming: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut seen = HashSet::with_capacity(existing.len() + incoming.len());
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for record in existing.iter().cloned().chain(incoming) {
        if record.name.trim().chars().count() <= MIN_NAME_CHARS {
            continue;
        }
        if seen.insert(record.identity_key()) {
            merged.push(record);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn record(name: &str, url: &str) -> ProductRecord {
        ProductRecord {
            id: None,
            name: name.to_string(),
            price: 10_000,
            brand: None,
            image_url: None,
            source_url: if url.is_empty() { None } else { Some(url.to_string()) },
            source: Source::Ssg,
        }
    }

    #[test]
    fn test_first_occurrence_wins_order_preserved() {
        let incoming = vec![
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("Gaming Keyboard", "https://ssg.com/p/2"),
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("USB Hub 7-port", "https://ssg.com/p/3"),
        ];

        let result = dedupe(&[], incoming);
        let names: Vec<_> = result.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Wireless Mouse", "Gaming Keyboard", "USB Hub 7-port"]);
    }

    #[test]
    fn test_incoming_deduped_against_existing() {
        let existing = dedupe(&[], vec![record("Wireless Mouse", "https://ssg.com/p/1")]);
        let incoming = vec![
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("Gaming Keyboard", "https://ssg.com/p/2"),
        ];

        let result = dedupe(&existing, incoming);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "Wireless Mouse");
        assert_eq!(result[1].name, "Gaming Keyboard");
    }

    #[test]
    fn test_short_names_filtered() {
        let incoming = vec![
            record("abc", "https://ssg.com/p/1"),
            record("  12345  ", "https://ssg.com/p/2"), // 5 chars after trim
            record("123456", "https://ssg.com/p/3"),    // 6 chars, kept
        ];

        let result = dedupe(&[], incoming);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "123456");
    }

    #[test]
    fn test_same_name_different_url_both_kept() {
        let incoming = vec![
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("Wireless Mouse", "https://shopping.naver.com/p/1"),
        ];

        let result = dedupe(&[], incoming);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_missing_url_dedupes_on_name_alone() {
        let incoming = vec![record("Wireless Mouse", ""), record("Wireless Mouse", "")];

        let result = dedupe(&[], incoming);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let batch = vec![
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("tiny", "https://ssg.com/p/2"),
            record("Gaming Keyboard", "https://ssg.com/p/3"),
            record("Wireless Mouse", "https://ssg.com/p/1"),
        ];
        let extra = vec![
            record("Gaming Keyboard", "https://ssg.com/p/3"),
            record("USB Hub 7-port", "https://ssg.com/p/4"),
        ];

        let once = dedupe(&batch, extra.clone());
        let prepass = dedupe(&dedupe(&batch, vec![]), extra);
        assert_eq!(once, prepass);
    }

    #[test]
    fn test_dedupe_self_equals_dedupe_empty() {
        let batch = vec![
            record("Wireless Mouse", "https://ssg.com/p/1"),
            record("Gaming Keyboard", "https://ssg.com/p/2"),
        ];

        assert_eq!(dedupe(&batch, vec![]), dedupe(&batch, batch.clone()));
    }
}
