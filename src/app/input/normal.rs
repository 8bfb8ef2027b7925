use super::dispatch;
use crate::app::state::{App, Tab};
use crate::app::RuntimeContext;
use crate::model::RecommendationStrategy;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

/// Handle key events in normal mode
pub(super) fn handle_normal_input(
    app: &mut App,
    key: KeyEvent,
    ctx: &RuntimeContext,
) -> Result<()> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit();
            return Ok(());
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.select_tab(Tab::from_index(index));
            return Ok(());
        }
        KeyCode::Tab => {
            app.next_tab();
            return Ok(());
        }
        KeyCode::BackTab => {
            app.prev_tab();
            return Ok(());
        }
        KeyCode::Char('r') => {
            // Refresh from Ready, retry from Error; ignored while loading
            if !app.is_loading() {
                let effect = app.request_load();
                dispatch(ctx, Some(effect));
            }
            return Ok(());
        }
        _ => {}
    }

    match app.tab {
        Tab::Dashboard => {}
        Tab::Reviews => handle_reviews_keys(app, key),
        Tab::Analysis => {
            if matches!(key.code, KeyCode::Char('i') | KeyCode::Enter) {
                app.start_compose();
            }
        }
        Tab::Recommendations => {
            let strategy = match key.code {
                KeyCode::Char('t') => Some(RecommendationStrategy::Trending),
                KeyCode::Char('h') => Some(RecommendationStrategy::Hybrid),
                KeyCode::Char('c') => Some(RecommendationStrategy::Collaborative),
                KeyCode::Char('o') => Some(RecommendationStrategy::Content),
                _ => None,
            };
            if let Some(strategy) = strategy {
                let effect = app.request_recommendations(strategy);
                dispatch(ctx, effect);
            }
        }
    }
    Ok(())
}

fn handle_reviews_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('f') | KeyCode::Right => app.next_category(),
        KeyCode::Left => app.prev_category(),
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        _ => {}
    }
}
