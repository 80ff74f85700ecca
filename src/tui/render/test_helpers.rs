use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::{NewProject, Task, TaskStatus, UiConfig};
use crate::store::TaskStore;
use crate::store::memory::{BoardData, MemoryApi};
use crate::tui::app::App;
use crate::tui::input::handle_key;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// To Do: A, B, C. In Progress: X. Done: Z.
pub fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new("A", "P-001", "A", TaskStatus::Todo, 0),
        Task::new("B", "P-001", "B", TaskStatus::Todo, 1),
        Task::new("C", "P-001", "C", TaskStatus::Todo, 2),
        Task::new("X", "P-001", "X", TaskStatus::InProgress, 0),
        Task::new("Z", "P-001", "Z", TaskStatus::Done, 0),
    ]
}

/// An App on project "Demo" (P-001), with the same tasks loaded locally and
/// held by an in-memory backend.
pub fn app_with_tasks(tasks: Vec<Task>) -> App {
    let mut data = BoardData::default();
    let project = data
        .create_project(&NewProject {
            name: "Demo".into(),
            ..NewProject::default()
        })
        .unwrap();
    data.tasks = tasks.clone();
    let api = Arc::new(MemoryApi::new(data));
    App::new(project, TaskStore::with_tasks(api, tasks), &UiConfig::default())
}

pub fn press(app: &mut App, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
}
