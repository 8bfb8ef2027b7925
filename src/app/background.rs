use super::messages::BackgroundMessage;
use super::state::Effect;
use crate::api::Gateway;
use crate::model::RecommendationStrategy;
use crate::pipeline::{load_dashboard, LoadLimits};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, error};

/// Everything a background task needs to talk back to the UI
#[derive(Clone)]
pub struct RuntimeContext {
    pub tx: mpsc::Sender<BackgroundMessage>,
    pub gateway: Arc<dyn Gateway>,
    pub limits: LoadLimits,
}

/// Run `fut` on the tokio runtime. A panic inside the task is reported to the
/// UI as an error message instead of disappearing silently.
pub fn spawn_background<F>(tx: mpsc::Sender<BackgroundMessage>, name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
            error!("background task '{}' panicked", name);
            let _ = tx.send(BackgroundMessage::Error(format!(
                "Background task '{}' crashed",
                name
            )));
        }
    });
}

/// Turn a controller effect into a spawned task.
pub fn execute(effect: Effect, ctx: &RuntimeContext) {
    match effect {
        Effect::LoadDashboard { generation } => {
            let tx = ctx.tx.clone();
            let gateway = Arc::clone(&ctx.gateway);
            let limits = ctx.limits;
            debug!("spawning load #{}", generation);
            spawn_background(ctx.tx.clone(), "load_dashboard", async move {
                let result = load_dashboard(gateway.as_ref(), limits).await;
                let _ = tx.send(BackgroundMessage::DashboardLoaded { generation, result });
            });
        }
        Effect::Analyze(request) => {
            let tx = ctx.tx.clone();
            let gateway = Arc::clone(&ctx.gateway);
            spawn_background(ctx.tx.clone(), "analyze_sentiment", async move {
                let outcome = request.run(gateway.as_ref()).await;
                let _ = tx.send(BackgroundMessage::AnalysisFinished(outcome));
            });
        }
        Effect::FetchRecommendations {
            generation,
            strategy,
            user_id,
            top_n,
        } => {
            let tx = ctx.tx.clone();
            let gateway = Arc::clone(&ctx.gateway);
            spawn_background(ctx.tx.clone(), "recommendations", async move {
                let result = match (strategy, user_id) {
                    (RecommendationStrategy::Trending, _) => gateway.trending(None, top_n).await,
                    (_, Some(user_id)) => gateway.recommendations(strategy, user_id, top_n).await,
                    (_, None) => {
                        let _ = tx.send(BackgroundMessage::Error(format!(
                            "{} recommendations need a user id",
                            strategy.name()
                        )));
                        return;
                    }
                };
                let _ = tx.send(BackgroundMessage::RecommendationsLoaded {
                    generation,
                    strategy,
                    result,
                });
            });
        }
    }
}
