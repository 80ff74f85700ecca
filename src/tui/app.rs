use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::board::{BoardController, Notice};
use crate::cli::handlers::{Context, runtime};
use crate::io::logging;
use crate::model::column::locate;
use crate::model::{Project, Task, UiConfig};
use crate::ops::gesture::DropTarget;
use crate::store::TaskStore;

use super::input;
use super::render;
use super::theme::Theme;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// A task is picked up; the cursor picks the drop slot
    Drag,
}

/// Position on the board. `row` may equal the column length in drag mode,
/// meaning the empty space below the last card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub column: usize,
    pub row: usize,
}

/// Main application state
pub struct App {
    pub board: BoardController,
    pub project: Project,
    pub mode: Mode,
    pub cursor: Cursor,
    pub drop_cursor: Cursor,
    pub theme: Theme,
    pub show_key_hints: bool,
    pub show_help: bool,
    pub should_quit: bool,
    /// Set by input; the event loop reloads the board
    pub refresh_requested: bool,
    notice: Arc<Mutex<Option<Notice>>>,
}

impl App {
    pub fn new(project: Project, store: TaskStore, ui: &UiConfig) -> Self {
        let notice = Arc::new(Mutex::new(None));
        let sink = notice.clone();
        let board = BoardController::new(store, project.id.clone(), move |n: Notice| {
            *sink.lock().unwrap_or_else(|e| e.into_inner()) = Some(n);
        });
        App {
            board,
            project,
            mode: Mode::Navigate,
            cursor: Cursor::default(),
            drop_cursor: Cursor::default(),
            theme: Theme::from_config(ui),
            show_key_hints: ui.show_key_hints,
            show_help: false,
            should_quit: false,
            refresh_requested: false,
            notice,
        }
    }

    /// Latest notice from the board, if any
    pub fn notice(&self) -> Option<Notice> {
        self.notice.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Show a message in the status row
    pub fn flash(&self, notice: Notice) {
        *self.notice.lock().unwrap_or_else(|e| e.into_inner()) = Some(notice);
    }

    pub fn clear_notice(&self) {
        *self.notice.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn column_count(&self) -> usize {
        self.board.columns().len()
    }

    pub fn column_len(&self, column: usize) -> usize {
        self.board.columns().get(column).map_or(0, |c| c.len())
    }

    /// Task under the navigation cursor
    pub fn cursor_task(&self) -> Option<&Task> {
        let columns = self.board.columns();
        let column = columns.get(self.cursor.column)?;
        column.tasks.get(self.cursor.row).copied()
    }

    /// Keep the cursor on an existing card (or row 0 of an empty column)
    pub fn clamp_cursor(&mut self) {
        let count = self.column_count();
        if count == 0 {
            self.cursor = Cursor::default();
            return;
        }
        self.cursor.column = self.cursor.column.min(count - 1);
        let len = self.column_len(self.cursor.column);
        self.cursor.row = self.cursor.row.min(len.saturating_sub(1));
    }

    /// Move the cursor onto a task wherever it currently is
    pub fn follow(&mut self, task_id: &str) {
        let columns = self.board.columns();
        if let Some((column, row, _)) = locate(&columns, task_id) {
            self.cursor = Cursor { column, row };
        }
    }

    /// What a drop at the drop cursor would land on
    pub fn drop_target(&self) -> Option<DropTarget> {
        let columns = self.board.columns();
        let column = columns.get(self.drop_cursor.column)?;
        Some(match column.tasks.get(self.drop_cursor.row) {
            Some(task) => DropTarget::Task(task.id.clone()),
            None => DropTarget::Column(column.status),
        })
    }
}

/// Run the TUI application
pub fn run(board_dir: Option<&str>, project: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load(board_dir, project, false)?;
    logging::init_file(&ctx.board_dir, ctx.config.log.level.as_deref())?;
    let rt = runtime()?;
    let project = rt.block_on(ctx.current_project())?;

    let mut app = App::new(project, TaskStore::new(ctx.api.clone()), &ctx.config.ui);
    rt.block_on(app.board.load())?;
    tracing::info!(project = %app.project.id, tasks = app.board.store().tasks().len(), "board opened");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &rt);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rt: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        // The optimistic board is on screen; now wait for the server
        if let Some(task_id) = app.board.pending().map(|p| p.task_id.clone()) {
            // Failures already produced a notice and a rollback
            let _ = rt.block_on(app.board.settle());
            app.follow(&task_id);
            app.clamp_cursor();
            continue;
        }

        if app.refresh_requested {
            app.refresh_requested = false;
            if let Err(e) = rt.block_on(app.board.load()) {
                tracing::warn!(error = %e, "refresh failed");
                app.flash(Notice::failure(format!("Refresh failed: {}", e)));
            }
            app.clamp_cursor();
        }

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{NoticeKind, Outcome};
    use crate::model::TaskStatus;
    use crate::tui::render::test_helpers::{app_with_tasks, press, sample_tasks};
    use crossterm::event::KeyCode;

    #[test]
    fn cursor_clamps_to_column() {
        let mut app = app_with_tasks(sample_tasks());
        app.cursor = Cursor { column: 9, row: 9 };
        app.clamp_cursor();
        assert_eq!(app.cursor, Cursor { column: 2, row: 0 });
        assert_eq!(app.cursor_task().map(|t| t.id.as_str()), Some("Z"));
    }

    #[test]
    fn drop_target_past_last_card_is_the_column() {
        let app = {
            let mut app = app_with_tasks(sample_tasks());
            app.drop_cursor = Cursor { column: 1, row: 1 };
            app
        };
        assert_eq!(
            app.drop_target(),
            Some(DropTarget::Column(TaskStatus::InProgress))
        );
    }

    #[tokio::test]
    async fn settle_commits_and_reports() {
        let mut app = app_with_tasks(sample_tasks());
        // C onto A: reorder within To Do
        app.cursor.row = 2;
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Enter);

        assert!(app.board.pending().is_some());
        app.board.settle().await.unwrap();
        assert_eq!(app.board.last_outcome(), Some(Outcome::Committed));
        let notice = app.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Tasks reordered successfully");

        let order: Vec<&str> = app.board.columns()[0].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn grab_clears_the_previous_notice() {
        let mut app = app_with_tasks(sample_tasks());
        app.flash(Notice::failure("Failed to move task"));
        press(&mut app, KeyCode::Char(' '));
        assert!(app.notice().is_none());
        assert_eq!(app.mode, Mode::Drag);
    }
}
