use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::gateway::{ComparePage, CompareStats, MarketplaceGateway, SearchPage};
use crate::models::{PageInfo, PriceObservation, Source};
use crate::utils::error::{AppError, Result};

/// `MarketplaceGateway` backed by the tracker backend's REST API.
///
/// Maps non-2xx responses to `AppError::Fetch` (retryable, caller's
/// choice); never retries on its own.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    products: Vec<Value>,
    pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
struct CompareResponse {
    products: Vec<Value>,
    #[serde(default)]
    price_stats: Option<CompareStats>,
}

#[derive(Debug, Deserialize)]
struct PriceHistoryResponse {
    price_history: Vec<PriceHistoryRow>,
}

#[derive(Debug, Deserialize)]
struct PriceHistoryRow {
    price: i64,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpGateway {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Fetch(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Turn a non-success response into a `Fetch` error, preferring the
    /// backend's own error message when it sends one.
    async fn check_status(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(AppError::Fetch(format!("{} failed: {}", operation, message)))
    }
}

#[async_trait]
impl MarketplaceGateway for HttpGateway {
    async fn search(
        &self,
        source: Source,
        keyword: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchPage> {
        let page_param = page.to_string();
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(self.endpoint("/api/search")?)
            .query(&[
                ("source", source.as_str()),
                ("keyword", keyword),
                ("page", page_param.as_str()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        let body: SearchResponse = Self::check_status("search", response).await?.json().await?;
        tracing::debug!(
            source = %source,
            keyword,
            page,
            products = body.products.len(),
            "search page fetched"
        );

        Ok(SearchPage {
            products: body.products,
            pagination: body.pagination,
        })
    }

    async fn compare(&self, source: Source, keyword: &str, limit: u32) -> Result<ComparePage> {
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(self.endpoint("/api/compare")?)
            .query(&[
                ("source", source.as_str()),
                ("keyword", keyword),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        let body: CompareResponse = Self::check_status("compare", response).await?.json().await?;

        Ok(ComparePage {
            products: body.products,
            price_stats: body.price_stats,
        })
    }

    async fn price_history(&self, product_id: &str, days: u32) -> Result<Vec<PriceObservation>> {
        let days_param = days.to_string();
        let response = self
            .client
            .get(self.endpoint(&format!("/api/price-history/{}", product_id))?)
            .query(&[("days", days_param.as_str())])
            .send()
            .await?;

        let body: PriceHistoryResponse =
            Self::check_status("price history", response).await?.json().await?;

        Ok(body
            .price_history
            .into_iter()
            .map(|row| PriceObservation {
                product_id: product_id.to_string(),
                price: row.price,
                recorded_at: row.recorded_at,
            })
            .collect())
    }

    async fn trigger_price_check(&self) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/api/price-check")?)
            .send()
            .await?;

        Self::check_status("price check trigger", response).await?;
        tracing::info!("price check triggered");
        Ok(())
    }
}
