use serde::{Deserialize, Serialize};

use crate::models::Source;

/// Pagination block as reported by a marketplace search response.
/// `total_pages` and `has_next` are trusted verbatim; the engine only
/// guards the advancement of its own `current_page`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub has_next: bool,
}

/// Per-source, per-keyword paging state. `current_page` starts at 1 and
/// only ever advances by exactly one per confirmed successful fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageCursor {
    pub source: Source,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub has_next: bool,
}

impl PageCursor {
    /// Cursor after the initial page-1 fetch.
    pub fn first(source: Source, info: &PageInfo) -> Self {
        Self {
            source,
            current_page: 1,
            total_pages: info.total_pages,
            total_results: info.total_results,
            has_next: info.has_next,
        }
    }

    /// Cursor after a confirmed successful fetch of the next page.
    /// Totals come from the fresh response; the local page advances by
    /// exactly one.
    pub fn advanced(&self, info: &PageInfo) -> Self {
        Self {
            source: self.source,
            current_page: self.current_page + 1,
            total_pages: info.total_pages,
            total_results: info.total_results,
            has_next: info.has_next,
        }
    }

    /// Page a `load_more` call would request.
    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }
}
