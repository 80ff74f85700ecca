use crossterm::event::{KeyCode, KeyEvent};

use crate::board::DropOutcome;
use crate::ops::gesture::DropTarget;
use crate::tui::app::{App, Mode};

pub(super) fn handle_drag(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.board.on_drag_cancel();
            app.mode = Mode::Navigate;
        }
        KeyCode::Left | KeyCode::Char('h') => {
            app.drop_cursor.column = app.drop_cursor.column.saturating_sub(1);
            clamp_drop_cursor(app);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.drop_cursor.column += 1;
            clamp_drop_cursor(app);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.drop_cursor.row = app.drop_cursor.row.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.drop_cursor.row += 1;
            clamp_drop_cursor(app);
        }
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => {
            let target = app.drop_target();
            release(app, target);
        }
        // Let go outside the board
        KeyCode::Char('x') => release(app, None),
        _ => {}
    }
}

/// The drop slot can sit one past the last card (the column's empty area)
fn clamp_drop_cursor(app: &mut App) {
    let count = app.column_count();
    if count == 0 {
        return;
    }
    app.drop_cursor.column = app.drop_cursor.column.min(count - 1);
    let len = app.column_len(app.drop_cursor.column);
    app.drop_cursor.row = app.drop_cursor.row.min(len);
}

fn release(app: &mut App, target: Option<DropTarget>) {
    app.mode = Mode::Navigate;
    let Some(task_id) = app.board.active_task_id().map(str::to_string) else {
        return;
    };
    match app.board.on_drag_end(target) {
        DropOutcome::Unchanged => {}
        DropOutcome::Ignored(e) => {
            tracing::debug!(%task_id, error = %e, "drop ignored");
        }
        // The event loop draws this state, then settles it
        DropOutcome::Pending => app.follow(&task_id),
    }
}
