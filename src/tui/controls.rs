//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_city(),
        KeyCode::Tab => app.next_panel(),
        KeyCode::Char('[') => app.shift_from(-1),
        KeyCode::Char(']') => app.shift_from(1),
        KeyCode::Char('{') => app.shift_to(-1),
        KeyCode::Char('}') => app.shift_to(1),
        KeyCode::Char('x') => app.clear_dates(),
        KeyCode::Char('f') => app.toggle_forecast(),
        KeyCode::Char('+' | '=') => app.horizon_up(),
        KeyCode::Char('-') => app.horizon_down(),
        KeyCode::Char('e') => app.export_forecast(),
        KeyCode::Char('r') => app.regenerate(),
        _ => {}
    }
}
