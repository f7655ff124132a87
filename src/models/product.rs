use serde::{Deserialize, Serialize};

use crate::models::Source;

/// Canonical search result shared by every marketplace adapter.
///
/// `id` is optional: freshly scraped listings have not been persisted by
/// the storage collaborator yet. Prices are integers in the minor
/// currency unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: Option<String>,
    pub name: String,
    pub price: i64,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub source: Source,
}

impl ProductRecord {
    /// Identity used to collapse repeated listings across pages and
    /// sources: the normalized `(source_url, name)` pair.
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}",
            self.source_url.as_deref().unwrap_or(""),
            self.name.trim()
        )
    }
}
