//! View state controller
//!
//! Owns the lifecycle (`ViewState`), tab selection, the dashboard snapshot
//! cell and all operator-controlled inputs. Every asynchronous result comes
//! back through `handle_message`; every piece of async work goes out as an
//! `Effect`. Nothing in here touches the network or the terminal.

use super::messages::BackgroundMessage;
use crate::error::{LoadError, TransportError, ValidationError};
use crate::model::{Recommendation, RecommendationStrategy, Review, SentimentAnalysis};
use crate::pipeline::{
    AnalysisOutcome, AnalysisRequest, BusyFlag, CategoryFilter, FilteredView, LoadSequencer,
    NoticeLevel, Notification, Snapshot, SnapshotCell,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Top-level lifecycle. Orthogonal to tab selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Loading,
    Ready,
    Error {
        message: String,
    },
}

/// Inputs to the lifecycle state machine. Stale load completions are dropped
/// by `App::finish_load` before they get here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    Requested,
    Succeeded,
    Failed,
}

/// The full transition table.
///
/// | from      | Requested | Succeeded | Failed |
/// |-----------|-----------|-----------|--------|
/// | Loading   | Loading   | Ready     | Error  |
/// | Ready     | Loading   | Ready     | Error  |
/// | Error     | Loading   | Ready     | Error  |
///
/// Stale completions never reach this table; the controller drops them
/// first. `message` is the operator text used for `Failed`.
pub fn transition(_from: &ViewState, event: LoadEvent, message: &str) -> ViewState {
    match event {
        LoadEvent::Requested => ViewState::Loading,
        LoadEvent::Succeeded => ViewState::Ready,
        LoadEvent::Failed => ViewState::Error {
            message: message.to_string(),
        },
    }
}

/// The four views of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Reviews,
    Analysis,
    Recommendations,
}

impl Tab {
    pub fn index(&self) -> usize {
        match self {
            Tab::Dashboard => 0,
            Tab::Reviews => 1,
            Tab::Analysis => 2,
            Tab::Recommendations => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Tab::Dashboard,
            1 => Tab::Reviews,
            2 => Tab::Analysis,
            3 => Tab::Recommendations,
            _ => Tab::Dashboard,
        }
    }

    pub fn count() -> usize {
        4
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Reviews => "reviews",
            Tab::Analysis => "analysis",
            Tab::Recommendations => "recommendations",
        }
    }
}

/// Where keystrokes go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Compose,
}

/// Toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
}

impl Toast {
    pub fn new(notification: &Notification) -> Self {
        Self {
            message: notification.message.clone(),
            level: notification.level,
            created_at: Instant::now(),
        }
    }

    /// Errors linger a little longer than confirmations
    pub fn is_expired(&self) -> bool {
        let ttl = match self.level {
            NoticeLevel::Info => 4,
            NoticeLevel::Error => 6,
        };
        self.created_at.elapsed().as_secs() >= ttl
    }
}

/// Recommendation panel state. Fetches here never touch the snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecommendationState {
    #[default]
    Idle,
    Loading(RecommendationStrategy),
    Ready {
        strategy: RecommendationStrategy,
        items: Vec<Recommendation>,
    },
    Failed {
        strategy: RecommendationStrategy,
        message: String,
    },
}

/// Async work requested by the controller.
#[derive(Debug)]
pub enum Effect {
    LoadDashboard {
        generation: u64,
    },
    Analyze(AnalysisRequest),
    FetchRecommendations {
        generation: u64,
        strategy: RecommendationStrategy,
        user_id: Option<i64>,
        top_n: usize,
    },
}

/// Main application state
pub struct App {
    pub view: ViewState,
    pub tab: Tab,
    pub input_mode: InputMode,
    snapshot: SnapshotCell,
    loads: LoadSequencer,
    pub search_query: String,
    pub category: CategoryFilter,
    filtered: FilteredView,
    /// Controlled analysis draft
    pub draft: String,
    pub busy: BusyFlag,
    pub last_analysis: Option<SentimentAnalysis>,
    pub recommendations: RecommendationState,
    recommendation_generation: u64,
    pub user_id: Option<i64>,
    pub top_n: usize,
    pub scroll_offset: usize,
    pub toast: Option<Toast>,
    pub should_quit: bool,
    pub loading_frame: usize,
}

impl App {
    pub fn new(user_id: Option<i64>, top_n: usize) -> Self {
        Self {
            view: ViewState::Loading,
            tab: Tab::default(),
            input_mode: InputMode::Normal,
            snapshot: SnapshotCell::default(),
            loads: LoadSequencer::default(),
            search_query: String::new(),
            category: CategoryFilter::All,
            filtered: FilteredView::default(),
            draft: String::new(),
            busy: BusyFlag::default(),
            last_analysis: None,
            recommendations: RecommendationState::Idle,
            recommendation_generation: 0,
            user_id,
            top_n,
            scroll_offset: 0,
            toast: None,
            should_quit: false,
            loading_frame: 0,
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Lifecycle
    // ───────────────────────────────────────────────────────────────────────

    /// Begin a dashboard load. Used at startup, on manual refresh and on
    /// retry from the error screen. Earlier in-flight loads become stale.
    pub fn request_load(&mut self) -> Effect {
        let generation = self.loads.next();
        self.view = transition(&self.view, LoadEvent::Requested, "");
        debug!("load #{} requested", generation);
        Effect::LoadDashboard { generation }
    }

    fn finish_load(&mut self, generation: u64, result: Result<Snapshot, LoadError>) {
        if !self.loads.is_latest(generation) {
            debug!(
                "dropping stale load #{} (latest is #{})",
                generation,
                self.loads.latest()
            );
            return;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot.publish(snapshot);
                self.view = transition(&self.view, LoadEvent::Succeeded, "");
            }
            Err(e) => {
                if e.source.is_timeout() {
                    warn!("load #{} timed out at {}", generation, e.stage.name());
                } else {
                    warn!("{}", e);
                }
                let message = e.operator_message();
                self.view = transition(&self.view, LoadEvent::Failed, message);
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.view == ViewState::Loading
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.get()
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Background results
    // ───────────────────────────────────────────────────────────────────────

    pub fn handle_message(&mut self, msg: BackgroundMessage) -> Option<Effect> {
        match msg {
            BackgroundMessage::DashboardLoaded { generation, result } => {
                self.finish_load(generation, result);
                None
            }
            BackgroundMessage::AnalysisFinished(outcome) => self.finish_analysis(outcome),
            BackgroundMessage::RecommendationsLoaded {
                generation,
                strategy,
                result,
            } => {
                self.finish_recommendations(generation, strategy, result);
                None
            }
            BackgroundMessage::Error(e) => {
                self.notify(Notification::error(format!(
                    "Error: {}",
                    crate::util::truncate(&e, 80)
                )));
                None
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Tabs (orthogonal to the lifecycle and to the filtered view)
    // ───────────────────────────────────────────────────────────────────────

    pub fn select_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.scroll_offset = 0;
        }
    }

    pub fn next_tab(&mut self) {
        self.select_tab(Tab::from_index((self.tab.index() + 1) % Tab::count()));
    }

    pub fn prev_tab(&mut self) {
        self.select_tab(Tab::from_index(
            (self.tab.index() + Tab::count() - 1) % Tab::count(),
        ));
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Review filtering
    // ───────────────────────────────────────────────────────────────────────

    /// Bring the filtered list up to date with its three dependencies.
    /// Cheap when nothing changed.
    pub fn sync_filtered(&mut self) -> &Arc<Vec<Review>> {
        self.filtered
            .refresh(&self.snapshot, &self.search_query, self.category)
    }

    pub fn filtered_reviews(&self) -> &Arc<Vec<Review>> {
        self.filtered.current()
    }

    #[cfg(test)]
    pub fn filter_recomputes(&self) -> u64 {
        self.filtered.recompute_count()
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn end_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn search_input(&mut self, c: char) {
        self.search_query.push(c);
        self.scroll_offset = 0;
    }

    pub fn search_backspace(&mut self) {
        self.search_query.pop();
        self.scroll_offset = 0;
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.scroll_offset = 0;
    }

    pub fn next_category(&mut self) {
        self.set_category(self.category.next());
    }

    pub fn prev_category(&mut self) {
        self.set_category(self.category.prev());
    }

    pub fn clear_filters(&mut self) {
        self.search_query.clear();
        self.set_category(CategoryFilter::All);
    }

    pub fn scroll_down(&mut self) {
        let max = self.filtered.current().len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Analysis
    // ───────────────────────────────────────────────────────────────────────

    pub fn start_compose(&mut self) {
        self.input_mode = InputMode::Compose;
    }

    pub fn end_compose(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn draft_push(&mut self, c: char) {
        self.draft.push(c);
    }

    pub fn draft_pop(&mut self) {
        self.draft.pop();
    }

    /// Submit the current draft, clearing it once accepted. Blank drafts and
    /// submissions while one is already running are silently ignored.
    pub fn submit_analysis(&mut self) -> Option<Effect> {
        match AnalysisRequest::prepare(&self.draft, &self.busy) {
            Ok(request) => {
                info!("submitting {} chars for analysis", request.text().chars().count());
                self.draft.clear();
                Some(Effect::Analyze(request))
            }
            Err(ValidationError::EmptyText) => None,
            Err(ValidationError::AlreadyRunning) => {
                debug!("analysis already running; ignoring submit");
                None
            }
        }
    }

    fn finish_analysis(&mut self, outcome: AnalysisOutcome) -> Option<Effect> {
        self.notify(outcome.notification.clone());
        let reload = outcome.needs_reload();
        if let Ok(analysis) = outcome.result {
            self.last_analysis = Some(analysis);
        }
        reload.then(|| self.request_load())
    }

    pub fn is_analyzing(&self) -> bool {
        self.busy.is_set()
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Recommendations
    // ───────────────────────────────────────────────────────────────────────

    pub fn request_recommendations(&mut self, strategy: RecommendationStrategy) -> Option<Effect> {
        if strategy.needs_subject() && self.user_id.is_none() {
            self.notify(Notification::error(format!(
                "{} recommendations need a user id (--user)",
                strategy.name()
            )));
            return None;
        }

        self.recommendation_generation += 1;
        self.recommendations = RecommendationState::Loading(strategy);
        Some(Effect::FetchRecommendations {
            generation: self.recommendation_generation,
            strategy,
            user_id: self.user_id,
            top_n: self.top_n,
        })
    }

    fn finish_recommendations(
        &mut self,
        generation: u64,
        strategy: RecommendationStrategy,
        result: Result<Vec<Recommendation>, TransportError>,
    ) {
        if generation != self.recommendation_generation {
            debug!("dropping stale {} recommendations", strategy.name());
            return;
        }
        self.recommendations = match result {
            Ok(items) => RecommendationState::Ready { strategy, items },
            Err(e) => {
                warn!("{} recommendations failed: {}", strategy.name(), e);
                RecommendationState::Failed {
                    strategy,
                    message: "Unable to load recommendations".to_string(),
                }
            }
        };
    }

    // ───────────────────────────────────────────────────────────────────────
    //  Chrome
    // ───────────────────────────────────────────────────────────────────────

    pub fn notify(&mut self, notification: Notification) {
        self.toast = Some(Toast::new(&notification));
    }

    pub fn clear_expired_toast(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    /// Advance spinner animation
    pub fn tick_loading(&mut self) {
        if self.is_loading() || self.is_analyzing() {
            self.loading_frame = self.loading_frame.wrapping_add(1);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadStage, LOAD_FAILED_MESSAGE};
    use crate::model::{fixtures, Sentiment};

    fn snapshot() -> Snapshot {
        Snapshot::assemble(
            fixtures::stats(),
            vec![
                fixtures::review(1, "Great phone", Sentiment::Positive, 5.0),
                fixtures::review(2, "Bad battery", Sentiment::Negative, 2.0),
            ],
            vec![fixtures::product(1, "Galaxy A54")],
        )
    }

    fn load_failure() -> LoadError {
        LoadError::new(
            LoadStage::Reviews,
            TransportError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            },
        )
    }

    fn generation_of(effect: Effect) -> u64 {
        match effect {
            Effect::LoadDashboard { generation } => generation,
            other => panic!("expected a load, got {other:?}"),
        }
    }

    fn loaded(generation: u64) -> BackgroundMessage {
        BackgroundMessage::DashboardLoaded {
            generation,
            result: Ok(snapshot()),
        }
    }

    fn ready_app() -> App {
        let mut app = App::new(None, 10);
        let generation = generation_of(app.request_load());
        app.handle_message(loaded(generation));
        app
    }

    #[test]
    fn test_transition_table() {
        for from in [
            ViewState::Loading,
            ViewState::Ready,
            ViewState::Error {
                message: "x".to_string(),
            },
        ] {
            assert_eq!(transition(&from, LoadEvent::Requested, ""), ViewState::Loading);
            assert_eq!(transition(&from, LoadEvent::Succeeded, ""), ViewState::Ready);
            assert_eq!(
                transition(&from, LoadEvent::Failed, "boom"),
                ViewState::Error {
                    message: "boom".to_string()
                }
            );
        }
    }

    #[test]
    fn test_starts_loading_on_dashboard_tab() {
        let app = App::new(None, 10);
        assert_eq!(app.view, ViewState::Loading);
        assert_eq!(app.tab, Tab::Dashboard);
        assert!(app.snapshot().is_none());
    }

    #[test]
    fn test_load_success_publishes_and_goes_ready() {
        let app = ready_app();
        assert_eq!(app.view, ViewState::Ready);
        assert_eq!(app.snapshot().unwrap().reviews.len(), 2);
    }

    #[test]
    fn test_load_failure_goes_error_with_generic_message() {
        let mut app = App::new(None, 10);
        let generation = generation_of(app.request_load());
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation,
            result: Err(load_failure()),
        });

        match &app.view {
            ViewState::Error { message } => {
                assert_eq!(message, LOAD_FAILED_MESSAGE);
                assert!(!message.contains("bad gateway"));
            }
            other => panic!("expected error state, got {other:?}"),
        }
        assert!(app.snapshot().is_none());
    }

    #[test]
    fn test_retry_from_error_reaches_ready() {
        let mut app = App::new(None, 10);
        let first = generation_of(app.request_load());
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation: first,
            result: Err(load_failure()),
        });

        let retry = generation_of(app.request_load());
        assert_eq!(app.view, ViewState::Loading);
        app.handle_message(loaded(retry));
        assert_eq!(app.view, ViewState::Ready);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_snapshot() {
        let mut app = ready_app();
        let refresh = generation_of(app.request_load());
        assert_eq!(app.view, ViewState::Loading);
        // Previous snapshot stays readable while the refresh is in flight
        assert!(app.snapshot().is_some());

        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation: refresh,
            result: Err(load_failure()),
        });
        assert!(matches!(app.view, ViewState::Error { .. }));
        assert_eq!(app.snapshot().unwrap().reviews.len(), 2);
    }

    #[test]
    fn test_stale_load_is_ignored() {
        let mut app = App::new(None, 10);
        let older = generation_of(app.request_load());
        let newer = generation_of(app.request_load());

        app.handle_message(loaded(newer));
        assert_eq!(app.view, ViewState::Ready);
        let published = Arc::clone(app.snapshot().unwrap());

        // The older load finishing last must not overwrite or flip state
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation: older,
            result: Err(load_failure()),
        });
        assert_eq!(app.view, ViewState::Ready);
        assert!(Arc::ptr_eq(&published, app.snapshot().unwrap()));
    }

    #[test]
    fn test_tab_switch_does_not_touch_lifecycle() {
        let mut app = App::new(None, 10);
        app.select_tab(Tab::Analysis);
        assert_eq!(app.view, ViewState::Loading);

        let generation = generation_of(app.request_load());
        app.handle_message(BackgroundMessage::DashboardLoaded {
            generation,
            result: Err(load_failure()),
        });
        assert_eq!(app.tab, Tab::Analysis);

        app.next_tab();
        assert_eq!(app.tab, Tab::Recommendations);
        app.next_tab();
        assert_eq!(app.tab, Tab::Dashboard);
        app.prev_tab();
        assert_eq!(app.tab, Tab::Recommendations);
    }

    #[test]
    fn test_tab_switch_does_not_recompute_filter() {
        let mut app = ready_app();
        let before = Arc::clone(app.sync_filtered());
        let count = app.filter_recomputes();

        app.select_tab(Tab::Reviews);
        app.select_tab(Tab::Recommendations);
        app.select_tab(Tab::Reviews);
        let after = Arc::clone(app.sync_filtered());

        assert_eq!(app.filter_recomputes(), count);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_filter_follows_query_and_category() {
        let mut app = ready_app();
        assert_eq!(app.sync_filtered().len(), 2);

        for c in "PHONE".chars() {
            app.search_input(c);
        }
        assert_eq!(app.sync_filtered().len(), 1);

        app.clear_filters();
        app.set_category(CategoryFilter::Only(Sentiment::Negative));
        let filtered = app.sync_filtered();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "Bad battery");
    }

    #[test]
    fn test_product_name_search_after_load() {
        let mut app = ready_app();
        app.search_query = "galaxy".to_string();
        assert_eq!(app.sync_filtered().len(), 2);
    }

    #[test]
    fn test_blank_draft_is_silently_ignored() {
        let mut app = ready_app();
        app.draft = "   ".to_string();
        assert!(app.submit_analysis().is_none());
        assert!(!app.is_analyzing());
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_submit_holds_busy_until_request_dropped() {
        let mut app = ready_app();
        app.draft = "Terrible service".to_string();

        let effect = app.submit_analysis().unwrap();
        assert!(app.is_analyzing());
        assert!(app.draft.is_empty());

        // Second submit while busy does nothing and keeps the new draft
        app.draft = "Still terrible".to_string();
        assert!(app.submit_analysis().is_none());
        assert_eq!(app.draft, "Still terrible");

        drop(effect);
        assert!(!app.is_analyzing());
    }

    #[test]
    fn test_successful_analysis_reloads_exactly_once() {
        let mut app = ready_app();
        let outcome = AnalysisOutcome {
            notification: Notification::info("Sentiment detected: Négatif"),
            result: Ok(SentimentAnalysis {
                sentiment: Sentiment::Negative,
                sentiment_score: -0.6,
                confidence: 0.8,
                language_detected: None,
            }),
        };

        let effect = app.handle_message(BackgroundMessage::AnalysisFinished(outcome));
        assert!(matches!(effect, Some(Effect::LoadDashboard { .. })));
        assert_eq!(app.view, ViewState::Loading);
        assert_eq!(app.toast.as_ref().unwrap().level, NoticeLevel::Info);
        assert!(app.toast.as_ref().unwrap().message.contains("Négatif"));
        assert_eq!(
            app.last_analysis.as_ref().map(|a| a.sentiment),
            Some(Sentiment::Negative)
        );
    }

    #[test]
    fn test_failed_analysis_notifies_without_reload() {
        let mut app = ready_app();
        let outcome = AnalysisOutcome {
            notification: Notification::error("Sentiment analysis failed"),
            result: Err(TransportError::Status {
                status: 500,
                body: String::new(),
            }),
        };

        let effect = app.handle_message(BackgroundMessage::AnalysisFinished(outcome));
        assert!(effect.is_none());
        assert_eq!(app.view, ViewState::Ready);
        assert_eq!(app.toast.as_ref().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_user_strategies_need_user_id() {
        let mut app = ready_app();
        assert!(app
            .request_recommendations(RecommendationStrategy::Hybrid)
            .is_none());
        assert_eq!(app.toast.as_ref().unwrap().level, NoticeLevel::Error);

        let effect = app.request_recommendations(RecommendationStrategy::Trending);
        assert!(matches!(
            effect,
            Some(Effect::FetchRecommendations {
                strategy: RecommendationStrategy::Trending,
                ..
            })
        ));
        assert_eq!(
            app.recommendations,
            RecommendationState::Loading(RecommendationStrategy::Trending)
        );
    }

    #[test]
    fn test_stale_recommendations_dropped() {
        let mut app = App::new(Some(7), 5);
        app.request_recommendations(RecommendationStrategy::Content);
        app.request_recommendations(RecommendationStrategy::Hybrid);

        app.handle_message(BackgroundMessage::RecommendationsLoaded {
            generation: 1,
            strategy: RecommendationStrategy::Content,
            result: Ok(Vec::new()),
        });
        assert_eq!(
            app.recommendations,
            RecommendationState::Loading(RecommendationStrategy::Hybrid)
        );

        app.handle_message(BackgroundMessage::RecommendationsLoaded {
            generation: 2,
            strategy: RecommendationStrategy::Hybrid,
            result: Ok(Vec::new()),
        });
        assert!(matches!(
            app.recommendations,
            RecommendationState::Ready {
                strategy: RecommendationStrategy::Hybrid,
                ..
            }
        ));
        // Recommendation traffic never touches the lifecycle
        assert_eq!(app.view, ViewState::Loading);
    }
}
