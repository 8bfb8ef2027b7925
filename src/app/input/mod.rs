mod compose;
mod normal;
mod search;

use super::background;
use super::state::{App, InputMode};
use super::RuntimeContext;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Route a key press to the handler for the current input mode
pub fn handle_key_event(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return Ok(());
    }

    match app.input_mode {
        InputMode::Search => search::handle_search_input(app, key),
        InputMode::Compose => compose::handle_compose_input(app, key, ctx),
        InputMode::Normal => normal::handle_normal_input(app, key, ctx),
    }
}

fn dispatch(ctx: &RuntimeContext, effect: Option<super::Effect>) {
    if let Some(effect) = effect {
        background::execute(effect, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeGateway;
    use crate::app::state::{Tab, ViewState};
    use crate::pipeline::{CategoryFilter, LoadLimits};
    use crate::model::Sentiment;
    use std::sync::{mpsc, Arc};

    fn ctx() -> (RuntimeContext, mpsc::Receiver<crate::app::messages::BackgroundMessage>) {
        let (tx, rx) = mpsc::channel();
        let ctx = RuntimeContext {
            tx,
            gateway: Arc::new(FakeGateway::new()),
            limits: LoadLimits::default(),
        };
        (ctx, rx)
    }

    fn press(app: &mut App, ctx: &RuntimeContext, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE), ctx).unwrap();
    }

    fn type_str(app: &mut App, ctx: &RuntimeContext, s: &str) {
        for c in s.chars() {
            press(app, ctx, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_number_keys_select_tabs() {
        let (ctx, _rx) = ctx();
        let mut app = App::new(None, 10);
        press(&mut app, &ctx, KeyCode::Char('3'));
        assert_eq!(app.tab, Tab::Analysis);
        press(&mut app, &ctx, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Recommendations);
        assert_eq!(app.view, ViewState::Loading);
    }

    #[test]
    fn test_search_mode_captures_letters() {
        let (ctx, _rx) = ctx();
        let mut app = App::new(None, 10);
        press(&mut app, &ctx, KeyCode::Char('2'));
        press(&mut app, &ctx, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);

        // 'q' is text here, not quit
        type_str(&mut app, &ctx, "quiet");
        assert!(!app.should_quit);
        assert_eq!(app.search_query, "quiet");

        press(&mut app, &ctx, KeyCode::Backspace);
        press(&mut app, &ctx, KeyCode::Enter);
        assert_eq!(app.search_query, "quie");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_category_cycles_on_reviews_tab() {
        let (ctx, _rx) = ctx();
        let mut app = App::new(None, 10);
        press(&mut app, &ctx, KeyCode::Char('2'));
        press(&mut app, &ctx, KeyCode::Char('f'));
        assert_eq!(app.category, CategoryFilter::OPTIONS[1]);
        press(&mut app, &ctx, KeyCode::Left);
        assert_eq!(app.category, CategoryFilter::All);

        app.set_category(CategoryFilter::Only(Sentiment::Neutral));
        app.search_query = "x".to_string();
        press(&mut app, &ctx, KeyCode::Char('c'));
        assert_eq!(app.category, CategoryFilter::All);
        assert!(app.search_query.is_empty());
    }

    #[test]
    fn test_blank_compose_submit_does_nothing() {
        let (ctx, rx) = ctx();
        let mut app = App::new(None, 10);
        press(&mut app, &ctx, KeyCode::Char('3'));
        press(&mut app, &ctx, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Compose);

        type_str(&mut app, &ctx, "  ");
        press(&mut app, &ctx, KeyCode::Enter);
        assert!(!app.is_analyzing());
        assert!(rx.try_recv().is_err());

        press(&mut app, &ctx, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_refresh_ignored_while_loading() {
        let (ctx, _rx) = ctx();
        let mut app = App::new(None, 10);
        // Still Loading: no task is spawned, so no runtime is needed
        press(&mut app, &ctx, KeyCode::Char('r'));
        assert_eq!(app.view, ViewState::Loading);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let (ctx, _rx) = ctx();
        let mut app = App::new(None, 10);
        app.start_compose();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &ctx,
        )
        .unwrap();
        assert!(app.should_quit);
    }
}
