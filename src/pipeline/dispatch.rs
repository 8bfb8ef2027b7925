//! On-demand sentiment analysis
//!
//! A request is prepared on the UI side (validation plus busy-flag
//! acquisition) and then run wherever the caller likes. The busy flag is held
//! by a guard inside the request, so it is released on every exit path.

use crate::api::Gateway;
use crate::error::{TransportError, ValidationError, ANALYSIS_FAILED_MESSAGE};
use crate::model::SentimentAnalysis;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared "analysis in flight" flag. Cheap to clone; all clones see the same
/// state.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Operator-facing result of an action. The presentation layer decides how
/// to show it.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn from_analysis(analysis: &SentimentAnalysis) -> Self {
        Self::info(format!(
            "Sentiment detected: {} · score {:.2} · confidence {:.0}%",
            analysis.sentiment,
            analysis.sentiment_score,
            analysis.confidence * 100.0
        ))
    }
}

/// Result of one classification call.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub notification: Notification,
    pub result: Result<SentimentAnalysis, TransportError>,
}

impl AnalysisOutcome {
    /// A successful classification may have persisted a review server-side,
    /// so the dashboard must be reloaded.
    pub fn needs_reload(&self) -> bool {
        self.result.is_ok()
    }
}

/// Validated text with the busy flag held.
#[derive(Debug)]
pub struct AnalysisRequest {
    text: String,
    _guard: BusyGuard,
}

impl AnalysisRequest {
    /// Refuse blank text and concurrent submissions. Neither refusal touches
    /// the busy flag.
    pub fn prepare(text: &str, busy: &BusyFlag) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let guard = busy.try_acquire().ok_or(ValidationError::AlreadyRunning)?;
        Ok(Self {
            text: text.to_string(),
            _guard: guard,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// One round trip to the classifier. The busy flag is released when this
    /// returns, whatever the outcome.
    pub async fn run(self, gateway: &dyn Gateway) -> AnalysisOutcome {
        match gateway.analyze_sentiment(&self.text).await {
            Ok(analysis) => {
                info!(
                    "analysis: {} (score {:.2}, confidence {:.2})",
                    analysis.sentiment, analysis.sentiment_score, analysis.confidence
                );
                AnalysisOutcome {
                    notification: Notification::from_analysis(&analysis),
                    result: Ok(analysis),
                }
            }
            Err(e) => {
                warn!("analysis failed: {}", e);
                AnalysisOutcome {
                    notification: Notification::error(ANALYSIS_FAILED_MESSAGE),
                    result: Err(e),
                }
            }
        }
    }
}

/// Prepare and run in one go.
pub async fn analyze(
    gateway: &dyn Gateway,
    busy: &BusyFlag,
    text: &str,
) -> Result<AnalysisOutcome, ValidationError> {
    let request = AnalysisRequest::prepare(text, busy)?;
    Ok(request.run(gateway).await)
}
