use crate::app::state::App;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

/// Handle key events while typing a review search
pub(super) fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => app.end_search(),
        KeyCode::Backspace => app.search_backspace(),
        KeyCode::Char(c) => app.search_input(c),
        _ => {}
    }
    Ok(())
}
