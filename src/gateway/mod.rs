use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{PageInfo, PriceObservation, Source, WatchlistEntry};
use crate::utils::error::Result;

pub mod http;
pub mod memory;

pub use http::HttpGateway;
pub use memory::MemoryWatchStore;

/// One page of raw search results from the marketplace backend. Rows
/// stay as raw JSON until the source adapter normalizes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub products: Vec<Value>,
    pub pagination: PageInfo,
}

/// A single comparison batch plus the backend's price aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparePage {
    pub products: Vec<Value>,
    pub price_stats: Option<CompareStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompareStats {
    pub min_price: i64,
    pub max_price: i64,
    pub avg_price: i64,
}

/// The external search/crawler backend. Transport and encoding are its
/// concern; the engine only depends on these operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceGateway: Send + Sync {
    async fn search(&self, source: Source, keyword: &str, page: u32, limit: u32)
        -> Result<SearchPage>;

    async fn compare(&self, source: Source, keyword: &str, limit: u32) -> Result<ComparePage>;

    async fn price_history(&self, product_id: &str, days: u32) -> Result<Vec<PriceObservation>>;

    /// Fire-and-forget trigger for the backend's scheduled price check.
    async fn trigger_price_check(&self) -> Result<()>;
}

#[async_trait]
impl<T: MarketplaceGateway + ?Sized> MarketplaceGateway for std::sync::Arc<T> {
    async fn search(&self, source: Source, keyword: &str, page: u32, limit: u32)
        -> Result<SearchPage> {
        (**self).search(source, keyword, page, limit).await
    }

    async fn compare(&self, source: Source, keyword: &str, limit: u32) -> Result<ComparePage> {
        (**self).compare(source, keyword, limit).await
    }

    async fn price_history(&self, product_id: &str, days: u32) -> Result<Vec<PriceObservation>> {
        (**self).price_history(product_id, days).await
    }

    async fn trigger_price_check(&self) -> Result<()> {
        (**self).trigger_price_check().await
    }
}

/// The external storage collaborator for watchlist entries. The
/// lifecycle manager owns the state-machine semantics; the store owns
/// persistence and the one atomic operation activation needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn insert(&self, entry: WatchlistEntry) -> Result<WatchlistEntry>;

    async fn get(&self, id: &str) -> Result<Option<WatchlistEntry>>;

    async fn list_temp(&self) -> Result<Vec<WatchlistEntry>>;

    async fn list_activated(&self, email: &str) -> Result<Vec<WatchlistEntry>>;

    async fn count_activated(&self, email: &str) -> Result<usize>;

    /// Conditionally transition an entry Temp -> Activated, binding it
    /// to `email`. Returns whether this call performed the transition;
    /// an entry that is already activated is left untouched and yields
    /// `false`, which is what makes bulk activation idempotent under
    /// concurrent callers.
    async fn activate(&self, id: &str, email: &str) -> Result<bool>;

    async fn delete(&self, id: &str) -> Result<()>;
}
