use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

/// Project title with a task count, separator line below
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // separator
        ])
        .split(area);

    let bg = app.theme.background;
    let width = chunks[0].width as usize;
    let mut spans = vec![
        Span::styled(" [#] ", Style::default().fg(app.theme.highlight).bg(bg)),
        Span::styled(
            app.project.name.clone(),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    let count = format!("{} tasks ", app.board.store().tasks().len());
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    if used + count.len() < width {
        spans.push(Span::styled(
            " ".repeat(width - used - count.len()),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(count, Style::default().fg(app.theme.dim).bg(bg)));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        chunks[0],
    );

    let separator = Span::styled(
        "\u{2500}".repeat(chunks[1].width as usize),
        Style::default().fg(app.theme.dim).bg(bg),
    );
    frame.render_widget(Paragraph::new(Line::from(separator)), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn header_shows_name_and_count() {
        let app = app_with_tasks(sample_tasks());
        let out = render_to_string(40, 2, |frame, area| render_header(frame, &app, area));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with(" [#] Demo"));
        assert!(lines[0].ends_with("5 tasks"));
        assert!(lines[1].starts_with("\u{2500}\u{2500}"));
    }
}
