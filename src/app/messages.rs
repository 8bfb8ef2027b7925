use crate::error::{LoadError, TransportError};
use crate::model::{Recommendation, RecommendationStrategy};
use crate::pipeline::{AnalysisOutcome, Snapshot};

/// Messages from background tasks to the main UI thread
#[derive(Debug)]
pub enum BackgroundMessage {
    /// A dashboard load finished. `generation` identifies which request.
    DashboardLoaded {
        generation: u64,
        result: Result<Snapshot, LoadError>,
    },
    AnalysisFinished(AnalysisOutcome),
    RecommendationsLoaded {
        generation: u64,
        strategy: RecommendationStrategy,
        result: Result<Vec<Recommendation>, TransportError>,
    },
    /// Generic error (a task died without reporting)
    Error(String),
}
