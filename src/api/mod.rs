//! Resource gateway for the FEELya analysis service
//!
//! One method per remote capability. No retries, no caching, no business
//! validation: every call is exactly one round trip and either yields a typed
//! payload or a `TransportError`.

use crate::error::TransportError;
use crate::model::{
    DashboardStats, Health, NewProduct, NewReview, Product, Recommendation,
    RecommendationStrategy, Review, SentimentAnalysis,
};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[cfg(test)]
pub(crate) mod fake;

/// Longest slice of an error body kept in a `TransportError::Status`.
const ERROR_BODY_LIMIT: usize = 200;

/// Paging parameters shared by the list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl Page {
    pub fn limit(limit: usize) -> Self {
        Self {
            skip: None,
            limit: Some(limit),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut q = Vec::new();
        if let Some(skip) = self.skip {
            q.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            q.push(("limit", limit.to_string()));
        }
        q
    }
}

/// Every remote capability the client consumes.
///
/// Carried as `Arc<dyn Gateway>` so the pipeline can run against a fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn reviews(&self, page: Page) -> Result<Vec<Review>, TransportError>;

    async fn create_review(&self, review: &NewReview) -> Result<Review, TransportError>;

    async fn products(&self, page: Page) -> Result<Vec<Product>, TransportError>;

    async fn product(&self, id: i64) -> Result<Product, TransportError>;

    async fn create_product(&self, product: &NewProduct) -> Result<Product, TransportError>;

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, TransportError>;

    /// Per-user ranking. `strategy` must not be `Trending`.
    async fn recommendations(
        &self,
        strategy: RecommendationStrategy,
        user_id: i64,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError>;

    async fn trending(
        &self,
        category: Option<&str>,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, TransportError>;

    async fn health(&self) -> Result<Health, TransportError>;
}

/// Payloads are read from a `data` field when the server wraps them,
/// otherwise the body is the payload.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(inner) => inner,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    let payload: Payload<T> = serde_json::from_str(body)?;
    Ok(payload.into_inner())
}

#[derive(Serialize)]
struct AnalyzeBody<'a> {
    text: &'a str,
}

/// reqwest-backed gateway.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("feelya/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Trailing slash so relative joins keep the versioned base path
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TransportError> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(path, query)?;
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("{} {} -> {}", method, path, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: crate::util::truncate(&text, ERROR_BODY_LIMIT),
            });
        }

        debug!("{} {} -> {} ({} bytes)", method, path, status, text.len());
        decode(&text)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        self.send::<T, ()>(Method::GET, path, query, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        self.send(Method::POST, path, &[], Some(body)).await
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn reviews(&self, page: Page) -> Result<Vec<Review>, TransportError> {
        self.get("/reviews/", &page.query()).await
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, TransportError> {
        self.post("/reviews/", review).await
    }

    async fn products(&self, page: Page) -> Result<Vec<Product>, TransportError> {
        self.get("/products/", &page.query()).await
    }

    async fn product(&self, id: i64) -> Result<Product, TransportError> {
        self.get(&format!("/products/{id}"), &[]).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, TransportError> {
        self.post("/products/", product).await
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, TransportError> {
        self.post("/analyze-sentiment/", &AnalyzeBody { text }).await
    }

    async fn recommendations(
        &self,
        strategy: RecommendationStrategy,
        user_id: i64,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError> {
        let path = format!("/recommendations/{}/{}", strategy.name(), user_id);
        self.get(&path, &[("top_n", top_n.to_string())]).await
    }

    async fn trending(
        &self,
        category: Option<&str>,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError> {
        let mut query = vec![("top_n", top_n.to_string())];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        self.get("/recommendations/trending/", &query).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, TransportError> {
        self.get("/stats/dashboard/", &[]).await
    }

    async fn health(&self) -> Result<Health, TransportError> {
        self.get("/health/", &[]).await
    }
}
