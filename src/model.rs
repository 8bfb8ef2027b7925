//! Data model shared by the gateway, the pipeline and the UI
//!
//! Every record here is an immutable snapshot of server state. The client
//! never edits a field in place; changes only appear after a fresh fetch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Closed set of sentiment labels produced by the classifier.
///
/// The server speaks French; English names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "Positif", alias = "Positive")]
    Positive,
    #[serde(rename = "Neutre", alias = "Neutral")]
    Neutral,
    #[serde(rename = "Négatif", alias = "Negative")]
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Canonical wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positif",
            Sentiment::Neutral => "Neutre",
            Sentiment::Negative => "Négatif",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Positif" | "Positive" => Some(Sentiment::Positive),
            "Neutre" | "Neutral" => Some(Sentiment::Neutral),
            "Négatif" | "Negatif" | "Negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown or missing labels become `None` rather than failing the whole list.
fn lenient_sentiment<'de, D>(deserializer: D) -> Result<Option<Sentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|s| {
        let parsed = Sentiment::parse(s);
        if parsed.is_none() {
            tracing::debug!("ignoring unknown sentiment label {:?}", s);
        }
        parsed
    }))
}

/// Server timestamps may be RFC 3339 or naive ISO-8601; naive ones are UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        None => Ok(None),
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Denormalized product info that may travel with a review.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One customer utterance plus its classification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    pub id: i64,
    pub text: String,
    #[serde(default, deserialize_with = "lenient_sentiment")]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Star rating, 1 to 5. The server stores it as a float.
    pub rating: f64,
    #[serde(default)]
    pub language: Option<String>,
    pub product_id: i64,
    #[serde(default)]
    pub product: Option<ProductRef>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn product_name(&self) -> Option<&str> {
        self.product.as_ref().and_then(|p| p.name.as_deref())
    }

    /// Rating clamped to whole stars.
    pub fn stars(&self) -> u8 {
        self.rating.round().clamp(1.0, 5.0) as u8
    }

    /// Confidence as a whole percentage, if the server reported one.
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence
            .map(|c| (c.clamp(0.0, 1.0) * 100.0).round() as u8)
    }

    /// Copy of this review carrying `name` as its denormalized product name.
    /// A name the server already sent is kept.
    pub(crate) fn with_product_name(&self, name: &str) -> Review {
        if self.product_name().is_some() {
            return self.clone();
        }
        Review {
            product: Some(ProductRef {
                id: self.product_id,
                name: Some(name.to_string()),
            }),
            ..self.clone()
        }
    }
}

/// Aggregate target of reviews.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    pub avg_rating: f64,
    pub total_reviews: u64,
    #[serde(default)]
    pub sentiment_score: f64,
    pub positive_reviews: u64,
    #[serde(default)]
    pub neutral_reviews: u64,
    #[serde(default)]
    pub negative_reviews: u64,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Share of positive reviews, rounded to a whole percent. `None` when the
    /// product has no reviews yet.
    pub fn positive_percent(&self) -> Option<u64> {
        if self.total_reviews == 0 {
            return None;
        }
        let ratio = self.positive_reviews as f64 / self.total_reviews as f64;
        Some((ratio * 100.0).round() as u64)
    }

    pub fn counts_consistent(&self) -> bool {
        self.positive_reviews <= self.total_reviews
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SentimentDistribution {
    pub positive_percentage: f64,
    pub neutral_percentage: f64,
    pub negative_percentage: f64,
}

impl SentimentDistribution {
    pub fn sum(&self) -> f64 {
        self.positive_percentage + self.neutral_percentage + self.negative_percentage
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Server-computed aggregate over all reviews. Replaced wholesale on every load.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardStats {
    pub total_reviews: u64,
    #[serde(default)]
    pub total_products: u64,
    pub positive_reviews: u64,
    pub neutral_reviews: u64,
    pub negative_reviews: u64,
    pub avg_rating: f64,
    #[serde(default)]
    pub avg_sentiment: f64,
    pub sentiment_distribution: SentimentDistribution,
    #[serde(default)]
    pub top_categories: Vec<CategoryCount>,
}

/// Rounding slack allowed on the percentage sum.
pub const DISTRIBUTION_TOLERANCE: f64 = 1.0;

impl DashboardStats {
    pub fn count_for(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive_reviews,
            Sentiment::Neutral => self.neutral_reviews,
            Sentiment::Negative => self.negative_reviews,
        }
    }

    pub fn percentage_for(&self, sentiment: Sentiment) -> f64 {
        let d = &self.sentiment_distribution;
        match sentiment {
            Sentiment::Positive => d.positive_percentage,
            Sentiment::Neutral => d.neutral_percentage,
            Sentiment::Negative => d.negative_percentage,
        }
    }

    pub fn counts_consistent(&self) -> bool {
        self.total_reviews == self.positive_reviews + self.neutral_reviews + self.negative_reviews
    }

    /// Percentages sum to 100 within tolerance. With no reviews the server
    /// reports all zeros, which is accepted.
    pub fn distribution_consistent(&self) -> bool {
        if self.total_reviews == 0 {
            return true;
        }
        (self.sentiment_distribution.sum() - 100.0).abs() <= DISTRIBUTION_TOLERANCE
    }
}

/// Classifier output for a piece of submitted text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub language_detected: Option<String>,
}

/// One ranked product from a recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendation {
    pub product_id: i64,
    pub product_name: String,
    pub score: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub sentiment_score: f64,
    #[serde(default)]
    pub total_reviews: u64,
}

/// Ranking strategies exposed by the recommendation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationStrategy {
    Collaborative,
    Content,
    Hybrid,
    Trending,
}

impl RecommendationStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RecommendationStrategy::Collaborative => "collaborative",
            RecommendationStrategy::Content => "content",
            RecommendationStrategy::Hybrid => "hybrid",
            RecommendationStrategy::Trending => "trending",
        }
    }

    /// Per-user strategies need a subject id; trending does not.
    pub fn needs_subject(&self) -> bool {
        !matches!(self, RecommendationStrategy::Trending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub product_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub rating: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn review(id: i64, text: &str, sentiment: Sentiment, rating: f64) -> Review {
        Review {
            id,
            text: text.to_string(),
            sentiment: Some(sentiment),
            sentiment_score: Some(0.5),
            confidence: Some(0.9),
            rating,
            language: Some("fr".to_string()),
            product_id: 1,
            product: None,
            created_at: parse_timestamp("2024-03-01T10:00:00").unwrap(),
        }
    }

    pub fn product(id: i64, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            category: "Electronique".to_string(),
            description: None,
            price: 1999.0,
            url: None,
            avg_rating: 4.2,
            total_reviews: 10,
            sentiment_score: 0.4,
            positive_reviews: 7,
            neutral_reviews: 2,
            negative_reviews: 1,
            created_at: None,
        }
    }

    pub fn stats() -> DashboardStats {
        DashboardStats {
            total_reviews: 3,
            total_products: 2,
            positive_reviews: 1,
            neutral_reviews: 1,
            negative_reviews: 1,
            avg_rating: 3.33,
            avg_sentiment: 0.0,
            sentiment_distribution: SentimentDistribution {
                positive_percentage: 33.3,
                neutral_percentage: 33.3,
                negative_percentage: 33.3,
            },
            top_categories: Vec::new(),
        }
    }
}
