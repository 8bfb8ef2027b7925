use super::dispatch;
use crate::app::state::App;
use crate::app::RuntimeContext;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

/// Handle key events while editing the analysis draft
pub(super) fn handle_compose_input(
    app: &mut App,
    key: KeyEvent,
    ctx: &RuntimeContext,
) -> Result<()> {
    match key.code {
        KeyCode::Esc => app.end_compose(),
        KeyCode::Enter => {
            let effect = app.submit_analysis();
            dispatch(ctx, effect);
        }
        KeyCode::Backspace => app.draft_pop(),
        KeyCode::Char(c) => app.draft_push(c),
        _ => {}
    }
    Ok(())
}
