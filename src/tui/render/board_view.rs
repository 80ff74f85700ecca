use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::model::column::Column;
use crate::model::{Task, TaskPriority};
use crate::tui::app::{App, Mode};

/// Render the three status columns side by side
pub fn render_board(frame: &mut Frame, app: &App, area: Rect) {
    let columns = app.board.columns();
    if columns.is_empty() {
        return;
    }
    let count = columns.len() as u32;
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns.iter().map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (index, (column, column_area)) in columns.iter().zip(areas.iter()).enumerate() {
        render_column(frame, app, index, column, *column_area);
    }
}

fn render_column(frame: &mut Frame, app: &App, index: usize, column: &Column<'_>, area: Rect) {
    let bg = app.theme.background;
    let dragging = app.mode == Mode::Drag;
    let focused = if dragging {
        app.drop_cursor.column == index
    } else {
        app.cursor.column == index
    };

    let border_color = if focused {
        app.theme.selection_border
    } else {
        app.theme.dim
    };
    let title = Span::styled(
        format!(" {} ({}) ", column.status.label(), column.len()),
        Style::default()
            .fg(app.theme.status_color(column.status))
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color).bg(bg))
        .title(title)
        .style(Style::default().bg(bg));
    let inner_width = block.inner(area).width as usize;

    let active = app.board.active_task_id();
    let mut lines: Vec<Line> = Vec::new();
    for (row, task) in column.tasks.iter().enumerate() {
        let is_drop_slot = dragging && focused && app.drop_cursor.row == row;
        let is_cursor = !dragging && focused && app.cursor.row == row;
        let is_active = active == Some(task.id.as_str());
        lines.push(card_line(app, task, inner_width, is_cursor, is_drop_slot, is_active));
    }

    if dragging && focused && app.drop_cursor.row >= column.len() {
        lines.push(Line::from(Span::styled(
            "\u{25B8} drop here",
            Style::default()
                .fg(app.theme.drop_marker)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )));
    } else if column.is_empty() {
        lines.push(Line::from(Span::styled(
            "  (empty)",
            Style::default().fg(app.theme.dim).bg(bg),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn card_line<'a>(
    app: &App,
    task: &'a Task,
    width: usize,
    is_cursor: bool,
    is_drop_slot: bool,
    is_active: bool,
) -> Line<'a> {
    let bg = if is_cursor {
        app.theme.selection_bg
    } else {
        app.theme.background
    };
    let (marker, marker_color) = if is_drop_slot {
        ("\u{25B8}", app.theme.drop_marker)
    } else if is_active {
        ("\u{00BB}", app.theme.highlight)
    } else {
        match task.priority {
            TaskPriority::High => ("!", app.theme.priority_color(task.priority)),
            TaskPriority::Medium => (" ", app.theme.priority_color(task.priority)),
            TaskPriority::Low => (".", app.theme.priority_color(task.priority)),
        }
    };

    let mut title_style = Style::default().fg(app.theme.text).bg(bg);
    if is_cursor {
        title_style = title_style.fg(app.theme.text_bright);
    }
    if is_active {
        title_style = title_style
            .fg(app.theme.dim)
            .add_modifier(Modifier::ITALIC);
    }

    // marker + space
    let title_width = width.saturating_sub(2);
    let title = truncate(&task.title, title_width);
    let used = 2 + display_width(&title);
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(marker_color).bg(bg)),
        Span::styled(" ", Style::default().bg(bg)),
        Span::styled(title, title_style),
    ];
    if is_cursor && used < width {
        spans.push(Span::styled(" ".repeat(width - used), Style::default().bg(bg)));
    }
    Line::from(spans)
}

fn display_width(s: &str) -> usize {
    s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Cut `s` to at most `max` display columns, ending in an ellipsis when cut
fn truncate(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('\u{2026}');
    out
}
