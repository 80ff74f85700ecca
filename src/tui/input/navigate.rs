use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::board::{BoardError, Notice};
use crate::tui::app::{App, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => app.should_quit = true,
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (_, KeyCode::Char('?')) => app.show_help = true,
        (_, KeyCode::Char('r')) => app.refresh_requested = true,

        (_, KeyCode::Left | KeyCode::Char('h')) => {
            app.cursor.column = app.cursor.column.saturating_sub(1);
            app.clamp_cursor();
        }
        (_, KeyCode::Right | KeyCode::Char('l')) => {
            app.cursor.column += 1;
            app.clamp_cursor();
        }
        (_, KeyCode::Up | KeyCode::Char('k')) => {
            app.cursor.row = app.cursor.row.saturating_sub(1);
        }
        (_, KeyCode::Down | KeyCode::Char('j')) => {
            app.cursor.row += 1;
            app.clamp_cursor();
        }
        (_, KeyCode::Char('g') | KeyCode::Home) => app.cursor.row = 0,
        (_, KeyCode::Char('G') | KeyCode::End) => {
            app.cursor.row = usize::MAX;
            app.clamp_cursor();
        }

        (_, KeyCode::Char(' ') | KeyCode::Char('m') | KeyCode::Enter) => grab(app),
        _ => {}
    }
}

/// Pick up the card under the cursor
fn grab(app: &mut App) {
    let Some(task_id) = app.cursor_task().map(|t| t.id.clone()) else {
        return;
    };
    match app.board.on_drag_start(&task_id) {
        Ok(()) => {
            app.clear_notice();
            app.drop_cursor = app.cursor;
            app.mode = Mode::Drag;
        }
        Err(BoardError::Busy) => app.flash(Notice::failure("Still saving the last move")),
        Err(e) => {
            tracing::debug!(%task_id, error = %e, "cannot start drag");
        }
    }
}
