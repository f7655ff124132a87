use std::collections::{HashMap, VecDeque};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use dealwatch::gateway::{ComparePage, MarketplaceGateway, SearchPage};
use dealwatch::models::{PageInfo, PriceObservation, Source};
use dealwatch::Result;

/// Gateway fake driven by a script of responses keyed by
/// `(keyword, page)`. Pages above 1 can be gated behind a semaphore so
/// tests can hold a fetch in flight and observe how the engine behaves
/// while it is pending.
pub struct ScriptedGateway {
    responses: StdMutex<HashMap<(String, u32), VecDeque<Result<SearchPage>>>>,
    calls: StdMutex<Vec<(Source, String, u32)>>,
    gate: Option<Semaphore>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            responses: StdMutex::new(HashMap::new()),
            calls: StdMutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Like `new`, but every fetch of a page above 1 blocks until the
    /// test calls `open`.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn script(&self, keyword: &str, page: u32, response: Result<SearchPage>) {
        self.responses
            .lock()
            .unwrap()
            .entry((keyword.to_string(), page))
            .or_default()
            .push_back(response);
    }

    /// Release `n` gated fetches.
    pub fn open(&self, n: usize) {
        self.gate
            .as_ref()
            .expect("gateway is not gated")
            .add_permits(n);
    }

    pub fn calls(&self) -> Vec<(Source, String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for_page(&self, page: u32) -> usize {
        self.calls().iter().filter(|c| c.2 == page).count()
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketplaceGateway for ScriptedGateway {
    async fn search(&self, source: Source, keyword: &str, page: u32, _limit: u32) -> Result<SearchPage> {
        self.calls
            .lock()
            .unwrap()
            .push((source, keyword.to_string(), page));

        if page > 1 {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&(keyword.to_string(), page))
            .and_then(VecDeque::pop_front);
        response.unwrap_or_else(|| panic!("no scripted response for ({}, page {})", keyword, page))
    }

    async fn compare(&self, _source: Source, _keyword: &str, _limit: u32) -> Result<ComparePage> {
        unimplemented!("compare is exercised through the HTTP gateway tests")
    }

    async fn price_history(&self, _product_id: &str, _days: u32) -> Result<Vec<PriceObservation>> {
        unimplemented!("price history is exercised through the HTTP gateway tests")
    }

    async fn trigger_price_check(&self) -> Result<()> {
        unimplemented!("price check is exercised through the HTTP gateway tests")
    }
}

pub fn raw_row(name: &str, url: &str) -> Value {
    json!({ "name": name, "price": 25_000, "url": url })
}

pub fn search_page(products: Vec<Value>, current: u32, total: u32, total_results: u64) -> SearchPage {
    SearchPage {
        products,
        pagination: PageInfo {
            current_page: current,
            total_pages: total,
            total_results,
            has_next: current < total,
        },
    }
}
