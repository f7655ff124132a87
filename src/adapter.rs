use regex::Regex;
use serde_json::Value;

use crate::models::{ProductRecord, Source};

/// Result of normalizing one raw payload: the usable records plus how
/// many rows were dropped as malformed.
#[derive(Debug, Clone)]
pub struct AdapterOutcome {
    pub records: Vec<ProductRecord>,
    pub dropped: usize,
}

/// Normalizes raw marketplace rows into canonical `ProductRecord`s.
///
/// Sources disagree on field naming (`current_price` vs `price`,
/// `brand` vs `seller`, `url` vs `product_url`) and on price encoding
/// (integers, floats, or display strings like `"1,234,000원"`), so
/// every field is read tolerantly. A row missing a usable name or price
/// is dropped and counted; it never fails the batch.
pub struct SourceAdapter {
    digits: Regex,
}

impl SourceAdapter {
    pub fn new() -> Self {
        Self {
            digits: Regex::new(r"\d+").unwrap(),
        }
    }

    pub fn normalize_batch(&self, source: Source, raw: &[Value]) -> AdapterOutcome {
        let mut records = Vec::with_capacity(raw.len());
        let mut dropped = 0;

        for row in raw {
            match self.normalize_row(source, row) {
                Some(record) => records.push(record),
                None => {
                    dropped += 1;
                    tracing::debug!(source = %source, row = %row, "dropped malformed row");
                }
            }
        }

        AdapterOutcome { records, dropped }
    }

    fn normalize_row(&self, source: Source, row: &Value) -> Option<ProductRecord> {
        let name = row.get("name").and_then(Value::as_str)?.trim();
        if name.is_empty() {
            return None;
        }

        // Prefer current_price; not every source sends it.
        let price = self
            .read_price(row.get("current_price"))
            .or_else(|| self.read_price(row.get("price")))?;
        if price < 0 {
            return None;
        }

        // 11st has no brand field and sends the seller name instead.
        let brand = non_empty_str(row.get("brand")).or_else(|| non_empty_str(row.get("seller")));
        let source_url = non_empty_str(row.get("url")).or_else(|| non_empty_str(row.get("product_url")));
        let image_url = non_empty_str(row.get("image_url"));
        let id = match row.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Some(ProductRecord {
            id,
            name: name.to_string(),
            price,
            brand,
            image_url,
            source_url,
            source,
        })
    }

    fn read_price(&self, value: Option<&Value>) -> Option<i64> {
        match value? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => self.parse_price_text(s),
            _ => None,
        }
    }

    /// Parse a display price like "1,234,000원" or "12900" by joining
    /// its digit groups. Strings with no digits are rejected.
    fn parse_price_text(&self, text: &str) -> Option<i64> {
        let digits: String = self
            .digits
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

impl Default for SourceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
