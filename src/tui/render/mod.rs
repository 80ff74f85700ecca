pub mod board_view;
pub mod header;
pub mod help_overlay;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::App;

/// Main render function: header, board, status row, then overlays
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (2 rows) | board | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title + separator
            Constraint::Min(1),    // columns
            Constraint::Length(1), // status row
        ])
        .split(area);

    header::render_header(frame, app, chunks[0]);
    board_view::render_board(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);

    // Help overlay (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn full_screen_layout() {
        let app = app_with_tasks(sample_tasks());
        let out = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &app));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("Demo"));
        assert!(out.contains("To Do (3)"));
        assert!(out.contains("In Progress (1)"));
        assert!(out.contains("Done (1)"));
        assert!(lines.last().unwrap().contains("? help"));
    }

    #[test]
    fn help_overlay_on_top() {
        let mut app = app_with_tasks(sample_tasks());
        app.show_help = true;
        let out = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &app));
        assert!(out.contains("Key Bindings"));
        assert!(out.contains("Pick up the selected card"));
    }
}
