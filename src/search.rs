use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::adapter::SourceAdapter;
use crate::dedup::dedupe;
use crate::gateway::{CompareStats, MarketplaceGateway};
use crate::models::{PageCursor, ProductRecord, Source};
use crate::utils::error::{AppError, Result};

/// The complete state of one search session: keyword, source, the
/// accumulated deduplicated records, and the paging cursor. It is a
/// plain serializable value so any caller (web client, CLI, test
/// harness) can persist and later `restore` it — the engine never
/// assumes a storage medium.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub source: Source,
    pub keyword: String,
    pub records: Vec<ProductRecord>,
    pub cursor: PageCursor,
}

/// Outcome of a `load_more` call.
#[derive(Debug, Clone)]
pub enum LoadMore {
    /// A page was fetched and merged; `appended` is the number of
    /// records that survived deduplication.
    Appended { appended: usize, snapshot: SessionSnapshot },
    /// Another caller's in-flight fetch completed first; this call
    /// observed its result instead of issuing a duplicate request.
    Coalesced { snapshot: SessionSnapshot },
    /// The cursor reports no further pages.
    Exhausted { snapshot: SessionSnapshot },
    /// The session switched keyword or source while the fetch was
    /// pending; the late result was discarded, not applied.
    Superseded,
}

/// Normalized comparison batch plus the backend's price aggregate,
/// passed through verbatim.
#[derive(Debug, Clone)]
pub struct CompareSummary {
    pub records: Vec<ProductRecord>,
    pub price_stats: Option<CompareStats>,
}

#[derive(Debug, Default)]
struct EngineState {
    generation: u64,
    session: Option<SessionSnapshot>,
}

/// Drives incremental search across the marketplace backend: one active
/// session per engine, page fetches strictly sequential, concurrent
/// `load_more` calls collapsed onto a single in-flight request, and the
/// cursor advanced only on a confirmed successful fetch.
pub struct SearchEngine<G> {
    gateway: G,
    adapter: SourceAdapter,
    page_size: u32,
    state: RwLock<EngineState>,
    // Serializes fetches; waiters re-check the cursor after acquiring
    // it so a page is never requested twice.
    fetch_permit: Mutex<()>,
}

impl<G: MarketplaceGateway> SearchEngine<G> {
    pub fn new(gateway: G, page_size: u32) -> Self {
        Self {
            gateway,
            adapter: SourceAdapter::new(),
            page_size,
            state: RwLock::new(EngineState::default()),
            fetch_permit: Mutex::new(()),
        }
    }

    /// Start a fresh session: accumulated records and cursor are reset,
    /// any in-flight fetch for the previous session is invalidated, and
    /// page 1 is fetched, normalized, and deduplicated.
    pub async fn search(&self, source: Source, keyword: &str) -> Result<SessionSnapshot> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation("search keyword is required".to_string()));
        }

        // Reset before fetching: switching keyword or source always
        // clears the previous session, even if the new fetch fails.
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.session = None;
            state.generation
        };

        let _permit = self.fetch_permit.lock().await;
        let page = self.gateway.search(source, keyword, 1, self.page_size).await?;
        let outcome = self.adapter.normalize_batch(source, &page.products);
        tracing::debug!(
            source = %source,
            keyword,
            kept = outcome.records.len(),
            dropped = outcome.dropped,
            "normalized first page"
        );

        let snapshot = SessionSnapshot {
            source,
            keyword: keyword.to_string(),
            records: dedupe(&[], outcome.records),
            cursor: PageCursor::first(source, &page.pagination),
        };

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.session = Some(snapshot.clone());
        } else {
            tracing::debug!(keyword, "discarding superseded search result");
        }
        Ok(snapshot)
    }

    /// Fetch the next page of the active session. Requests
    /// `current_page + 1` only while the cursor reports `has_next`;
    /// a failed fetch leaves cursor and records untouched, so a
    /// caller-driven retry is safe.
    pub async fn load_more(&self) -> Result<LoadMore> {
        // Position observed before queueing behind any in-flight fetch.
        let (generation, observed_page) = {
            let state = self.state.read().await;
            let session = Self::active_session(&state)?;
            if !session.cursor.has_next {
                return Ok(LoadMore::Exhausted { snapshot: session.clone() });
            }
            (state.generation, session.cursor.current_page)
        };

        let _permit = self.fetch_permit.lock().await;

        // Re-read: the session may have advanced or switched while this
        // caller waited for the permit.
        let (source, keyword, cursor) = {
            let state = self.state.read().await;
            if state.generation != generation {
                return Ok(LoadMore::Superseded);
            }
            let session = Self::active_session(&state)?;
            if session.cursor.current_page != observed_page {
                return Ok(LoadMore::Coalesced { snapshot: session.clone() });
            }
            if !session.cursor.has_next {
                return Ok(LoadMore::Exhausted { snapshot: session.clone() });
            }
            (session.source, session.keyword.clone(), session.cursor.clone())
        };

        let page = self
            .gateway
            .search(source, &keyword, cursor.next_page(), self.page_size)
            .await?;
        let outcome = self.adapter.normalize_batch(source, &page.products);

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(%keyword, "discarding stale page for switched session");
            return Ok(LoadMore::Superseded);
        }
        let Some(session) = state.session.as_mut() else {
            return Ok(LoadMore::Superseded);
        };

        let merged = dedupe(&session.records, outcome.records);
        let appended = merged.len() - session.records.len();
        session.records = merged;
        session.cursor = session.cursor.advanced(&page.pagination);
        tracing::debug!(
            %keyword,
            page = session.cursor.current_page,
            appended,
            dropped = outcome.dropped,
            "merged page"
        );

        Ok(LoadMore::Appended {
            appended,
            snapshot: session.clone(),
        })
    }

    /// Single comparison batch for a keyword, normalized and deduped,
    /// with the backend's `{min, max, avg}` aggregate passed through.
    pub async fn compare(&self, source: Source, keyword: &str, limit: u32) -> Result<CompareSummary> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation("search keyword is required".to_string()));
        }

        let page = self.gateway.compare(source, keyword, limit).await?;
        let outcome = self.adapter.normalize_batch(source, &page.products);

        Ok(CompareSummary {
            records: dedupe(&[], outcome.records),
            price_stats: page.price_stats,
        })
    }

    /// Current session state, if any.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.read().await.session.clone()
    }

    /// Install a previously persisted session. Invalidates any fetch
    /// still in flight for the old session.
    pub async fn restore(&self, snapshot: SessionSnapshot) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.session = Some(snapshot);
    }

    fn active_session(state: &EngineState) -> Result<&SessionSnapshot> {
        state.session.as_ref().ok_or(AppError::NotFound {
            resource: "active search session".to_string(),
        })
    }
}

/// First pages for one keyword across several sources, fetched
/// concurrently. Sources are fully independent: each result carries its
/// own session snapshot with its own cursor, and one source failing
/// does not disturb the others.
pub async fn search_sources<G>(
    gateway: &G,
    sources: &[Source],
    keyword: &str,
    page_size: u32,
) -> Vec<(Source, Result<SessionSnapshot>)>
where
    G: MarketplaceGateway + Clone,
{
    let fetches = sources.iter().map(|&source| {
        let engine = SearchEngine::new(gateway.clone(), page_size);
        async move { (source, engine.search(source, keyword).await) }
    });
    futures::future::join_all(fetches).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SearchPage;
    use crate::models::PageInfo;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    struct ScriptedGateway {
        responses: tokio::sync::Mutex<VecDeque<Result<SearchPage>>>,
        calls: StdMutex<Vec<(Source, String, u32)>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<SearchPage>>) -> Self {
            Self {
                responses: tokio::sync::Mutex::new(responses.into()),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Source, String, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketplaceGateway for ScriptedGateway {
        async fn search(
            &self,
            source: Source,
            keyword: &str,
            page: u32,
            _limit: u32,
        ) -> Result<SearchPage> {
            self.calls
                .lock()
                .unwrap()
                .push((source, keyword.to_string(), page));
            self.responses
                .lock()
                .await
                .pop_front()
                .expect("script exhausted")
        }

        async fn compare(
            &self,
            _source: Source,
            _keyword: &str,
            _limit: u32,
        ) -> Result<crate::gateway::ComparePage> {
            unimplemented!("not used in these tests")
        }

        async fn price_history(
            &self,
            _product_id: &str,
            _days: u32,
        ) -> Result<Vec<crate::models::PriceObservation>> {
            unimplemented!("not used in these tests")
        }

        async fn trigger_price_check(&self) -> Result<()> {
            unimplemented!("not used in these tests")
        }
    }

    fn row(name: &str, url: &str) -> Value {
        json!({ "name": name, "price": 10_000, "url": url })
    }

    fn page(products: Vec<Value>, current: u32, total: u32) -> Result<SearchPage> {
        Ok(SearchPage {
            products,
            pagination: PageInfo {
                current_page: current,
                total_pages: total,
                total_results: u64::from(total) * 2,
                has_next: current < total,
            },
        })
    }

    #[tokio::test]
    async fn test_search_fetches_page_one() {
        let gateway = ScriptedGateway::new(vec![page(
            vec![row("Wireless Mouse", "https://ssg.com/p/1")],
            1,
            3,
        )]);
        let engine = SearchEngine::new(gateway, 20);

        let snapshot = engine.search(Source::Ssg, "mouse").await.unwrap();

        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.cursor.current_page, 1);
        assert!(snapshot.cursor.has_next);
        assert_eq!(engine.gateway.calls(), vec![(Source::Ssg, "mouse".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_load_more_advances_by_exactly_one() {
        let gateway = ScriptedGateway::new(vec![
            page(vec![row("Wireless Mouse", "https://ssg.com/p/1")], 1, 3),
            page(vec![row("Gaming Keyboard", "https://ssg.com/p/2")], 2, 3),
            page(vec![row("USB Hub 7-port", "https://ssg.com/p/3")], 3, 3),
        ]);
        let engine = SearchEngine::new(gateway, 20);

        engine.search(Source::Ssg, "desk setup").await.unwrap();

        let LoadMore::Appended { appended, snapshot } = engine.load_more().await.unwrap() else {
            panic!("expected Appended");
        };
        assert_eq!(appended, 1);
        assert_eq!(snapshot.cursor.current_page, 2);

        let LoadMore::Appended { snapshot, .. } = engine.load_more().await.unwrap() else {
            panic!("expected Appended");
        };
        assert_eq!(snapshot.cursor.current_page, 3);
        assert!(!snapshot.cursor.has_next);
        assert_eq!(snapshot.records.len(), 3);

        let pages: Vec<u32> = engine.gateway.calls().iter().map(|c| c.2).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_load_more_when_exhausted_is_noop() {
        let gateway = ScriptedGateway::new(vec![page(
            vec![row("Wireless Mouse", "https://ssg.com/p/1")],
            1,
            1,
        )]);
        let engine = SearchEngine::new(gateway, 20);

        engine.search(Source::Ssg, "mouse").await.unwrap();

        assert!(matches!(
            engine.load_more().await.unwrap(),
            LoadMore::Exhausted { .. }
        ));
        // No second request went out.
        assert_eq!(engine.gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cursor_untouched() {
        let gateway = ScriptedGateway::new(vec![
            page(vec![row("Wireless Mouse", "https://ssg.com/p/1")], 1, 3),
            Err(AppError::Fetch("connection reset".to_string())),
            page(vec![row("Gaming Keyboard", "https://ssg.com/p/2")], 2, 3),
        ]);
        let engine = SearchEngine::new(gateway, 20);

        engine.search(Source::Ssg, "mouse").await.unwrap();
        let before = engine.snapshot().await.unwrap();

        let err = engine.load_more().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(engine.snapshot().await.unwrap(), before);

        // Retry requests the same page and succeeds.
        let LoadMore::Appended { snapshot, .. } = engine.load_more().await.unwrap() else {
            panic!("expected Appended");
        };
        assert_eq!(snapshot.cursor.current_page, 2);

        let pages: Vec<u32> = engine.gateway.calls().iter().map(|c| c.2).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_switching_keyword_resets_session() {
        let gateway = ScriptedGateway::new(vec![
            page(
                vec![
                    row("Wireless Mouse", "https://ssg.com/p/1"),
                    row("Vertical Mouse", "https://ssg.com/p/2"),
                ],
                1,
                3,
            ),
            page(vec![row("Mechanical Keyboard", "https://ssg.com/p/3")], 1, 2),
        ]);
        let engine = SearchEngine::new(gateway, 20);

        engine.search(Source::Ssg, "mouse").await.unwrap();
        let snapshot = engine.search(Source::Ssg, "keyboard").await.unwrap();

        assert_eq!(snapshot.keyword, "keyboard");
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.cursor.current_page, 1);

        // Both fetches requested page 1.
        let pages: Vec<u32> = engine.gateway.calls().iter().map(|c| c.2).collect();
        assert_eq!(pages, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_load_more_without_session_errors() {
        let gateway = ScriptedGateway::new(vec![]);
        let engine = SearchEngine::new(gateway, 20);

        let err = engine.load_more().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_blank_keyword_rejected() {
        let gateway = ScriptedGateway::new(vec![]);
        let engine = SearchEngine::new(gateway, 20);

        let err = engine.search(Source::Naver, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_sources_runs_independently() {
        use std::sync::Arc;

        // One response per source; one of the three fails. The queue
        // order is not tied to a particular source, so assert on
        // aggregate shape.
        let gateway = Arc::new(ScriptedGateway::new(vec![
            page(vec![row("Wireless Mouse A", "https://a.example/p/1")], 1, 2),
            Err(AppError::Fetch("one source down".to_string())),
            page(vec![row("Wireless Mouse B", "https://b.example/p/1")], 1, 3),
        ]));

        let sources = [Source::Ssg, Source::Naver, Source::EleventhStreet];
        let results = search_sources(&gateway, &sources, "mouse", 20).await;

        assert_eq!(results.len(), 3);
        let succeeded: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
        let failed: Vec<_> = results.iter().filter(|(_, r)| r.is_err()).collect();
        assert_eq!(succeeded.len(), 2);
        assert_eq!(failed.len(), 1);

        // Each snapshot is tagged with and cursored for its own source.
        for (source, result) in &results {
            if let Ok(snapshot) = result {
                assert_eq!(snapshot.source, *source);
                assert_eq!(snapshot.cursor.source, *source);
                assert_eq!(snapshot.cursor.current_page, 1);
            }
        }
    }

    #[tokio::test]
    async fn test_restore_resumes_pagination() {
        let gateway = ScriptedGateway::new(vec![page(
            vec![row("Gaming Keyboard", "https://ssg.com/p/2")],
            2,
            2,
        )]);
        let engine = SearchEngine::new(gateway, 20);

        let persisted = SessionSnapshot {
            source: Source::Ssg,
            keyword: "keyboard".to_string(),
            records: vec![ProductRecord {
                id: None,
                name: "Wireless Keyboard".to_string(),
                price: 50_000,
                brand: None,
                image_url: None,
                source_url: Some("https://ssg.com/p/1".to_string()),
                source: Source::Ssg,
            }],
            cursor: PageCursor {
                source: Source::Ssg,
                current_page: 1,
                total_pages: 2,
                total_results: 4,
                has_next: true,
            },
        };

        engine.restore(persisted).await;
        let LoadMore::Appended { snapshot, .. } = engine.load_more().await.unwrap() else {
            panic!("expected Appended");
        };

        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.cursor.current_page, 2);
        assert_eq!(engine.gateway.calls(), vec![(Source::Ssg, "keyboard".to_string(), 2)]);
    }
}
