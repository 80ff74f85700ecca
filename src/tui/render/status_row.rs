use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::board::{BoardPhase, NoticeKind};
use crate::tui::app::{App, Mode};

const NAVIGATE_HINTS: &str = "hjkl move  space grab  r refresh  ? help  q quit";
const DRAG_HINTS: &str = "hjkl choose slot  enter drop  x drop outside  esc cancel";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    let hint = match (app.mode, app.board.phase()) {
        (_, BoardPhase::Reconciling { task_id }) => {
            spans.push(Span::styled(
                format!("saving {}\u{2026}", task_id),
                Style::default().fg(app.theme.yellow).bg(bg),
            ));
            None
        }
        (Mode::Drag, _) => {
            spans.push(Span::styled(
                " DRAG ",
                Style::default()
                    .fg(app.theme.background)
                    .bg(app.theme.drop_marker)
                    .add_modifier(Modifier::BOLD),
            ));
            if let Some(task_id) = app.board.active_task_id() {
                spans.push(Span::styled(
                    format!(" {}", task_id),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ));
            }
            Some(DRAG_HINTS)
        }
        (Mode::Navigate, _) => {
            if let Some(notice) = app.notice() {
                let color = match notice.kind {
                    NoticeKind::Success => app.theme.green,
                    NoticeKind::Failure => app.theme.red,
                };
                spans.push(Span::styled(notice.message, Style::default().fg(color).bg(bg)));
            }
            Some(NAVIGATE_HINTS)
        }
    };

    // Right-aligned key hints when they fit
    if let Some(hint) = hint.filter(|_| app.show_key_hints) {
        let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let hint_width = hint.chars().count();
        if content_width + hint_width < width {
            let padding = width - content_width - hint_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Notice;
    use crate::tui::render::test_helpers::*;

    fn status_line(app: &App) -> String {
        render_to_string(TERM_W, 1, |frame, area| render_status_row(frame, app, area))
    }

    #[test]
    fn navigate_shows_hints() {
        let app = app_with_tasks(sample_tasks());
        assert!(status_line(&app).ends_with("q quit"));
    }

    #[test]
    fn hints_can_be_turned_off() {
        let mut app = app_with_tasks(sample_tasks());
        app.show_key_hints = false;
        assert_eq!(status_line(&app), "");
    }

    #[test]
    fn notice_is_shown_on_the_left() {
        let app = app_with_tasks(sample_tasks());
        app.flash(Notice::failure("Failed to move task"));
        assert!(status_line(&app).starts_with("Failed to move task"));
    }

    #[test]
    fn drag_mode_names_the_task() {
        let mut app = app_with_tasks(sample_tasks());
        app.board.on_drag_start("B").unwrap();
        app.mode = Mode::Drag;
        let line = status_line(&app);
        assert!(line.starts_with(" DRAG  B"));
        assert!(line.ends_with("esc cancel"));
    }
}
