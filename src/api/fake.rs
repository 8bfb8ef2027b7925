//! Scripted in-memory gateway for tests

use super::{Gateway, Page};
use crate::error::TransportError;
use crate::model::{
    DashboardStats, Health, NewProduct, NewReview, Product, Recommendation,
    RecommendationStrategy, Review, SentimentAnalysis,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Reviews(Page),
    CreateReview,
    Products(Page),
    Product(i64),
    CreateProduct,
    Analyze(String),
    Recommendations(RecommendationStrategy, i64, usize),
    Trending(Option<String>, usize),
    Stats,
    Health,
}

/// Every call is recorded; calls whose kind was marked failing return a 503,
/// and calls whose kind was marked panicking panic.
#[derive(Default)]
pub struct FakeGateway {
    pub stats: DashboardStats,
    pub reviews: Vec<Review>,
    pub products: Vec<Product>,
    pub analysis: Option<SentimentAnalysis>,
    pub recommendations: Vec<Recommendation>,
    failing: Mutex<HashSet<&'static str>>,
    panicking: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
    /// Snapshot of an external flag taken when `analyze_sentiment` runs.
    probe: Option<Arc<AtomicBool>>,
    probed: Mutex<Vec<bool>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, kind: &'static str) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn panic_on(&self, kind: &'static str) {
        self.panicking.lock().unwrap().insert(kind);
    }

    pub fn heal(&self, kind: &'static str) {
        self.failing.lock().unwrap().remove(kind);
        self.panicking.lock().unwrap().remove(kind);
    }

    pub fn with_probe(mut self, flag: Arc<AtomicBool>) -> Self {
        self.probe = Some(flag);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn probed(&self) -> Vec<bool> {
        self.probed.lock().unwrap().clone()
    }

    fn record(&self, call: Call, kind: &'static str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(call);
        let panics = self.panicking.lock().unwrap().contains(kind);
        if panics {
            panic!("{kind} blew up");
        }
        if self.failing.lock().unwrap().contains(kind) {
            return Err(TransportError::Status {
                status: 503,
                body: format!("{kind} unavailable"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn reviews(&self, page: Page) -> Result<Vec<Review>, TransportError> {
        self.record(Call::Reviews(page), "reviews")?;
        Ok(self.reviews.clone())
    }

    async fn create_review(&self, _review: &NewReview) -> Result<Review, TransportError> {
        self.record(Call::CreateReview, "create_review")?;
        self.reviews.first().cloned().ok_or(TransportError::Status {
            status: 500,
            body: "no review scripted".to_string(),
        })
    }

    async fn products(&self, page: Page) -> Result<Vec<Product>, TransportError> {
        self.record(Call::Products(page), "products")?;
        Ok(self.products.clone())
    }

    async fn product(&self, id: i64) -> Result<Product, TransportError> {
        self.record(Call::Product(id), "product")?;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(TransportError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn create_product(&self, _product: &NewProduct) -> Result<Product, TransportError> {
        self.record(Call::CreateProduct, "create_product")?;
        self.products.first().cloned().ok_or(TransportError::Status {
            status: 500,
            body: "no product scripted".to_string(),
        })
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentAnalysis, TransportError> {
        if let Some(flag) = &self.probe {
            self.probed.lock().unwrap().push(flag.load(Ordering::SeqCst));
        }
        self.record(Call::Analyze(text.to_string()), "analyze")?;
        self.analysis.clone().ok_or(TransportError::Status {
            status: 500,
            body: "no analysis scripted".to_string(),
        })
    }

    async fn recommendations(
        &self,
        strategy: RecommendationStrategy,
        user_id: i64,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError> {
        self.record(Call::Recommendations(strategy, user_id, top_n), "recommendations")?;
        Ok(self.recommendations.clone())
    }

    async fn trending(
        &self,
        category: Option<&str>,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, TransportError> {
        self.record(Call::Trending(category.map(str::to_string), top_n), "trending")?;
        Ok(self.recommendations.clone())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, TransportError> {
        self.record(Call::Stats, "stats")?;
        Ok(self.stats.clone())
    }

    async fn health(&self) -> Result<Health, TransportError> {
        self.record(Call::Health, "health")?;
        Ok(Health {
            status: "healthy".to_string(),
            message: None,
        })
    }
}
