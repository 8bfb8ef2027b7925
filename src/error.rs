//! Error taxonomy for the client
//!
//! Transport failures come from the gateway, validation failures are
//! client-side refusals, and load failures wrap a transport error with the
//! stage that produced it.

use thiserror::Error;

/// What the operator sees when a dashboard load fails. Internal detail goes
/// to the log only.
pub const LOAD_FAILED_MESSAGE: &str =
    "Unable to load data. Check that the analysis service is running.";

/// What the operator sees when a sentiment analysis call fails.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Sentiment analysis failed";

/// A single round trip to the analysis service went wrong.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// The request future panicked before producing a response.
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Network(e) if e.is_timeout())
    }
}

/// Client-side refusal to issue a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("analysis text is empty")]
    EmptyText,

    #[error("an analysis is already running")]
    AlreadyRunning,
}

/// Which fetch of the dashboard sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Stats,
    Reviews,
    Products,
}

impl LoadStage {
    pub fn name(&self) -> &'static str {
        match self {
            LoadStage::Stats => "stats",
            LoadStage::Reviews => "reviews",
            LoadStage::Products => "products",
        }
    }
}

#[derive(Debug, Error)]
#[error("dashboard load failed while fetching {}: {source}", stage.name())]
pub struct LoadError {
    pub stage: LoadStage,
    #[source]
    pub source: TransportError,
}

impl LoadError {
    pub fn new(stage: LoadStage, source: TransportError) -> Self {
        Self { stage, source }
    }

    /// Generic operator-facing text; never exposes the transport detail.
    pub fn operator_message(&self) -> &'static str {
        LOAD_FAILED_MESSAGE
    }
}
