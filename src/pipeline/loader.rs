//! Dashboard loading
//!
//! Three fetches, strictly in order (stats, reviews, products). Nothing is
//! published unless all three succeed, and a published snapshot is only ever
//! replaced wholesale.

use crate::api::{Gateway, Page};
use crate::error::{LoadError, LoadStage, TransportError};
use crate::model::{DashboardStats, Product, Review};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caps applied to the list fetches of a dashboard load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLimits {
    pub reviews: usize,
    pub products: usize,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            reviews: 100,
            products: 50,
        }
    }
}

/// The atomically published tuple of stats, reviews and products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub stats: DashboardStats,
    pub reviews: Vec<Review>,
    pub products: Vec<Product>,
}

impl Snapshot {
    /// Assemble a snapshot, giving reviews without a product name the name
    /// of the matching product from the same load.
    pub fn assemble(stats: DashboardStats, reviews: Vec<Review>, products: Vec<Product>) -> Self {
        let names: HashMap<i64, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();
        let reviews = reviews
            .iter()
            .map(|r| match names.get(&r.product_id) {
                Some(name) if r.product_name().is_none() => r.with_product_name(name),
                _ => r.clone(),
            })
            .collect();

        Self {
            stats,
            reviews,
            products,
        }
    }

    /// Most recent reviews first.
    pub fn recent_reviews(&self, n: usize) -> Vec<&Review> {
        let mut recent: Vec<&Review> = self.reviews.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(n);
        recent
    }

    /// Products in server order (best sentiment first).
    pub fn top_products(&self, n: usize) -> &[Product] {
        &self.products[..n.min(self.products.len())]
    }
}

/// Fetch stats, then reviews, then products. The first failure aborts the
/// sequence; later fetches are never issued. A fetch that panics counts as a
/// failure of its stage.
pub async fn load_dashboard(
    gateway: &dyn Gateway,
    limits: LoadLimits,
) -> Result<Snapshot, LoadError> {
    let stats = fetch(LoadStage::Stats, gateway.dashboard_stats()).await?;
    let reviews = fetch(LoadStage::Reviews, gateway.reviews(Page::limit(limits.reviews))).await?;
    let products =
        fetch(LoadStage::Products, gateway.products(Page::limit(limits.products))).await?;

    if !stats.counts_consistent() {
        warn!(
            "stats counts disagree: total {} vs {}+{}+{}",
            stats.total_reviews, stats.positive_reviews, stats.neutral_reviews, stats.negative_reviews
        );
    }
    if !stats.distribution_consistent() {
        warn!(
            "sentiment distribution sums to {:.1}",
            stats.sentiment_distribution.sum()
        );
    }

    for product in products.iter().filter(|p| !p.counts_consistent()) {
        warn!(
            "product {} reports {} positive of {} reviews",
            product.id, product.positive_reviews, product.total_reviews
        );
    }

    debug!(
        "loaded {} reviews, {} products",
        reviews.len(),
        products.len()
    );

    Ok(Snapshot::assemble(stats, reviews, products))
}

async fn fetch<T, F>(stage: LoadStage, fut: F) -> Result<T, LoadError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result.map_err(|e| LoadError::new(stage, e)),
        Err(panic) => {
            let reason = panic_reason(panic.as_ref());
            warn!("{} fetch panicked: {}", stage.name(), reason);
            Err(LoadError::new(stage, TransportError::Aborted(reason)))
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Hands out load generations. Only the most recently issued generation may
/// publish; anything older is stale.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    issued: u64,
}

impl LoadSequencer {
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_latest(&self, generation: u64) -> bool {
        generation == self.issued
    }

    pub fn latest(&self) -> u64 {
        self.issued
    }
}

/// The single dashboard snapshot cell. Readers get a shared handle; the only
/// write is a full replacement.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: Option<Arc<Snapshot>>,
    version: u64,
}

impl SnapshotCell {
    pub fn get(&self) -> Option<&Arc<Snapshot>> {
        self.current.as_ref()
    }

    /// Bumped on every publish; derived views key their cache on it.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn publish(&mut self, snapshot: Snapshot) {
        self.version += 1;
        info!(
            "snapshot v{} published ({} reviews, {} products)",
            self.version,
            snapshot.reviews.len(),
            snapshot.products.len()
        );
        self.current = Some(Arc::new(snapshot));
    }
}
