mod drag;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Mode};

use drag::handle_drag;
use navigate::handle_navigate;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    // Help overlay swallows everything except its own close keys
    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Drag => handle_drag(app, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use crate::tui::render::test_helpers::{app_with_tasks, press, sample_tasks};
    use crate::board::BoardPhase;

    #[test]
    fn help_overlay_blocks_navigation() {
        let mut app = app_with_tasks(sample_tasks());
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.cursor.column, 0);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
    }

    #[test]
    fn grab_move_and_drop_on_column_end() {
        let mut app = app_with_tasks(sample_tasks());
        // grab A (todo, row 0), carry it to the end of In Progress
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.mode, Mode::Drag);
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Navigate);
        let pending = app.board.pending().expect("drop should be pending");
        assert_eq!(pending.moved_to, Some(TaskStatus::InProgress));
        // applied locally before anything is sent
        let a = app.board.store().get("A").unwrap();
        assert_eq!((a.status, a.position), (TaskStatus::InProgress, 1));
        assert!(matches!(app.board.phase(), BoardPhase::Reconciling { .. }));
        // cursor follows the card
        assert_eq!((app.cursor.column, app.cursor.row), (1, 1));
    }

    #[test]
    fn esc_cancels_drag_without_changes() {
        let mut app = app_with_tasks(sample_tasks());
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.board.pending().is_none());
        assert_eq!(*app.board.phase(), BoardPhase::Idle);
    }

    #[test]
    fn drop_outside_leaves_board_alone() {
        let mut app = app_with_tasks(sample_tasks());
        let before = app.board.store().tasks().to_vec();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.board.pending().is_none());
        assert_eq!(app.board.store().tasks(), before.as_slice());
    }

    #[test]
    fn drop_in_place_is_a_no_op() {
        let mut app = app_with_tasks(sample_tasks());
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert!(app.board.pending().is_none());
        assert_eq!(app.cursor.row, 1);
    }
}
