use crate::model::column::{Column, locate};
use crate::model::{TaskFilter, TaskStatus, TaskUpdate};
use crate::ops::gesture::{DropTarget, GestureError, interpret};
use crate::ops::reconcile::reconcile;
use crate::store::{ApiError, Snapshot, StoreError, TaskStore};

use super::notify::{Notice, Notifier};

/// Error type for board gestures
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Gesture(#[from] GestureError),
    #[error("reorder failed: {0}")]
    RemoteReorderFailed(#[source] ApiError),
    #[error("no drag in progress")]
    NotDragging,
    #[error("a reorder is still waiting for the server")]
    Busy,
    #[error("no project selected (use --project or `tb use <project>`)")]
    NoProject,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the controller is in the drag lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoardPhase {
    #[default]
    Idle,
    Dragging { task_id: String },
    /// Optimistic state applied, remote reorder not settled yet
    Reconciling { task_id: String },
}

/// How the most recent reorder ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    RolledBack,
}

/// A drop that has been applied locally and still has to be sent. Held by
/// the controller until `settle` runs.
#[derive(Debug)]
pub struct PendingReorder {
    pub project_id: String,
    pub task_id: String,
    pub updates: Vec<TaskUpdate>,
    /// Set when the task changed columns
    pub moved_to: Option<TaskStatus>,
    snapshot: Snapshot,
}

/// Result of releasing a drag
#[derive(Debug)]
#[must_use]
pub enum DropOutcome {
    /// Dropped outside any target or back where it started
    Unchanged,
    /// The gesture referenced something that is not on the board
    Ignored(BoardError),
    /// Applied optimistically; `settle` sends it
    Pending,
}

/// Drives drag-and-drop on one project's board.
///
/// A drop is split in two: `on_drag_end` interprets it, reconciles positions,
/// and applies the batch to the store right away; `settle` sends the batch
/// and either commits the server's answer or restores the snapshot. A UI can
/// redraw between the two. The batch stays in the controller in between, so
/// no drop can be left half applied.
pub struct BoardController {
    store: TaskStore,
    project_id: String,
    phase: BoardPhase,
    pending: Option<PendingReorder>,
    last_outcome: Option<Outcome>,
    notifier: Box<dyn Notifier>,
}

impl BoardController {
    pub fn new(store: TaskStore, project_id: impl Into<String>, notifier: impl Notifier + 'static) -> Self {
        BoardController {
            store,
            project_id: project_id.into(),
            phase: BoardPhase::Idle,
            pending: None,
            last_outcome: None,
            notifier: Box::new(notifier),
        }
    }

    /// Fetch the project's tasks
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let filter = TaskFilter::project(&self.project_id);
        self.store.fetch(Some(&filter)).await
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaskStore {
        &mut self.store
    }

    pub fn columns(&self) -> Vec<Column<'_>> {
        self.store.columns()
    }

    pub fn phase(&self) -> &BoardPhase {
        &self.phase
    }

    /// The drop waiting for `settle`, if any
    pub fn pending(&self) -> Option<&PendingReorder> {
        self.pending.as_ref()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Task currently being dragged (or waiting on its reorder)
    pub fn active_task_id(&self) -> Option<&str> {
        match &self.phase {
            BoardPhase::Idle => None,
            BoardPhase::Dragging { task_id } | BoardPhase::Reconciling { task_id } => Some(task_id),
        }
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    pub fn on_drag_start(&mut self, task_id: &str) -> Result<(), BoardError> {
        if self.pending.is_some() {
            return Err(BoardError::Busy);
        }
        if self.store.get(task_id).is_none() {
            tracing::debug!(task_id, "drag start on unknown task");
            return Err(GestureError::TaskNotFound(task_id.to_string()).into());
        }
        tracing::trace!(task_id, "drag start");
        self.phase = BoardPhase::Dragging {
            task_id: task_id.to_string(),
        };
        Ok(())
    }

    pub fn on_drag_cancel(&mut self) {
        if let BoardPhase::Dragging { task_id } = &self.phase {
            tracing::trace!(%task_id, "drag cancelled");
            self.phase = BoardPhase::Idle;
        }
    }

    /// Release the dragged task over `target` (`None`: outside any target).
    /// Nothing is sent to the remote here.
    pub fn on_drag_end(&mut self, target: Option<DropTarget>) -> DropOutcome {
        let active = match &self.phase {
            BoardPhase::Dragging { task_id } => task_id.clone(),
            _ => return DropOutcome::Ignored(BoardError::NotDragging),
        };
        self.phase = BoardPhase::Idle;

        let Some(target) = target else {
            tracing::trace!(task_id = %active, "dropped outside the board");
            return DropOutcome::Unchanged;
        };

        let (project_id, moved_to, updates) = {
            let columns = self.store.columns();
            let placement = match interpret(&columns, &active, &target) {
                Ok(Some(placement)) => placement,
                Ok(None) => return DropOutcome::Unchanged,
                Err(e) => {
                    tracing::debug!(task_id = %active, ?target, error = %e, "drop ignored");
                    return DropOutcome::Ignored(e.into());
                }
            };
            let updates = match reconcile(&columns, &active, placement) {
                Ok(updates) => updates,
                Err(e) => return DropOutcome::Ignored(e.into()),
            };
            let Some((_, _, task)) = locate(&columns, &active) else {
                return DropOutcome::Ignored(GestureError::TaskNotFound(active).into());
            };
            let moved_to = (task.status != placement.status).then_some(placement.status);
            (task.project_id.clone(), moved_to, updates)
        };
        if updates.is_empty() {
            return DropOutcome::Unchanged;
        }

        tracing::debug!(task_id = %active, count = updates.len(), "applying reorder locally");
        let snapshot = self.store.apply_optimistic(&updates);
        self.phase = BoardPhase::Reconciling {
            task_id: active.clone(),
        };
        self.pending = Some(PendingReorder {
            project_id,
            task_id: active,
            updates,
            moved_to,
            snapshot,
        });
        DropOutcome::Pending
    }

    /// Send the pending reorder. On success the server's tasks are merged in;
    /// on failure the snapshot is restored. Either way exactly one notice is
    /// emitted and the controller returns to idle. Does nothing when no drop
    /// is pending.
    pub async fn settle(&mut self) -> Result<(), BoardError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let api = std::sync::Arc::clone(self.store.api());
        let result = api.reorder_tasks(&pending.project_id, &pending.updates).await;
        self.phase = BoardPhase::Idle;

        match result {
            Ok(tasks) => {
                tracing::info!(
                    task_id = %pending.task_id,
                    project = %pending.project_id,
                    count = pending.updates.len(),
                    "reorder committed"
                );
                self.store.commit(tasks);
                self.last_outcome = Some(Outcome::Committed);
                let message = match pending.moved_to {
                    Some(status) => format!("Task moved to {}", status.as_str().replace('_', " ").to_lowercase()),
                    None => "Tasks reordered successfully".to_string(),
                };
                self.notifier.notify(Notice::success(message));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(task_id = %pending.task_id, error = %e, "reorder failed, rolling back");
                self.store.rollback(pending.snapshot, &e);
                self.last_outcome = Some(Outcome::RolledBack);
                let message = match pending.moved_to {
                    Some(_) => "Failed to move task",
                    None => "Failed to reorder tasks",
                };
                self.notifier.notify(Notice::failure(message));
                Err(BoardError::RemoteReorderFailed(e))
            }
        }
    }

    /// Drag `task_id` onto `target` and wait for the result. Returns whether
    /// anything moved. Unlike the UI path, gesture errors are returned.
    pub async fn drop_on(&mut self, task_id: &str, target: DropTarget) -> Result<bool, BoardError> {
        self.on_drag_start(task_id)?;
        match self.on_drag_end(Some(target)) {
            DropOutcome::Unchanged => Ok(false),
            DropOutcome::Ignored(e) => Err(e),
            DropOutcome::Pending => self.settle().await.map(|_| true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::notify::NoticeKind;
    use crate::model::{NewProject, Task};
    use crate::store::memory::{BoardData, MemoryApi};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    struct Fixture {
        api: Arc<MemoryApi>,
        board: BoardController,
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    /// TODO: [A, B, C], IN_PROGRESS: [X], DONE: [Z]
    async fn fixture() -> Fixture {
        let mut data = BoardData::default();
        data.create_project(&NewProject {
            name: "Demo".into(),
            ..NewProject::default()
        })
        .unwrap();
        data.tasks = vec![
            Task::new("A", "P-001", "A", TaskStatus::Todo, 0),
            Task::new("B", "P-001", "B", TaskStatus::Todo, 1),
            Task::new("C", "P-001", "C", TaskStatus::Todo, 2),
            Task::new("X", "P-001", "X", TaskStatus::InProgress, 0),
            Task::new("Z", "P-001", "Z", TaskStatus::Done, 0),
        ];
        let api = Arc::new(MemoryApi::new(data));
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        let mut board = BoardController::new(TaskStore::new(api.clone()), "P-001", move |n: Notice| {
            sink.lock().unwrap().push(n)
        });
        board.load().await.unwrap();
        Fixture { api, board, notices }
    }

    fn column(board: &BoardController, status: TaskStatus) -> Vec<(String, usize)> {
        board
            .columns()
            .into_iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.iter().map(|t| (t.id.clone(), t.position)).collect())
            .unwrap_or_default()
    }

    fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
        items.iter().map(|(id, p)| (id.to_string(), *p)).collect()
    }

    #[tokio::test]
    async fn test_reorder_within_column() {
        let mut f = fixture().await;
        f.board.on_drag_start("A").unwrap();
        assert_eq!(f.board.active_task_id(), Some("A"));
        let outcome = f.board.on_drag_end(Some(DropTarget::Task("C".into())));
        assert!(matches!(outcome, DropOutcome::Pending), "got {outcome:?}");
        assert_eq!(
            f.board.pending().unwrap().updates,
            vec![
                TaskUpdate::position("B", 0),
                TaskUpdate::position("C", 1),
                TaskUpdate::position("A", 2),
            ]
        );
        // optimistic state is visible before the server answers
        assert_eq!(column(&f.board, TaskStatus::Todo), pairs(&[("B", 0), ("C", 1), ("A", 2)]));
        assert!(matches!(f.board.phase(), BoardPhase::Reconciling { .. }));

        f.board.settle().await.unwrap();
        assert_eq!(f.board.phase(), &BoardPhase::Idle);
        assert!(f.board.pending().is_none());
        assert_eq!(f.board.last_outcome(), Some(Outcome::Committed));
        assert_eq!(f.api.reorder_calls(), 1);
        let notices = f.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Success);
        assert_eq!(notices[0].message, "Tasks reordered successfully");
    }

    #[tokio::test]
    async fn test_move_to_empty_column() {
        let mut f = fixture().await;
        // empty DONE first
        f.board.drop_on("Z", DropTarget::Column(TaskStatus::Todo)).await.unwrap();
        assert!(column(&f.board, TaskStatus::Done).is_empty());

        let moved = f.board.drop_on("X", DropTarget::Column(TaskStatus::Done)).await.unwrap();
        assert!(moved);
        assert_eq!(column(&f.board, TaskStatus::Done), pairs(&[("X", 0)]));
        assert!(column(&f.board, TaskStatus::InProgress).is_empty());
        let notices = f.notices.lock().unwrap();
        assert_eq!(notices.last().unwrap().message, "Task moved to done");
    }

    #[tokio::test]
    async fn test_move_onto_task_in_other_column() {
        let mut f = fixture().await;
        f.board.on_drag_start("Z").unwrap();
        assert!(matches!(
            f.board.on_drag_end(Some(DropTarget::Task("A".into()))),
            DropOutcome::Pending
        ));
        let pending = f.board.pending().unwrap();
        assert_eq!(pending.moved_to, Some(TaskStatus::Todo));
        assert!(pending.updates.contains(&TaskUpdate::moved("Z", 0, TaskStatus::Todo)));
        f.board.settle().await.unwrap();
        assert_eq!(
            column(&f.board, TaskStatus::Todo),
            pairs(&[("Z", 0), ("A", 1), ("B", 2), ("C", 3)])
        );
        assert!(column(&f.board, TaskStatus::Done).is_empty());
    }

    #[tokio::test]
    async fn test_drop_in_place_is_noop() {
        let mut f = fixture().await;
        assert!(!f.board.drop_on("B", DropTarget::Task("B".into())).await.unwrap());
        assert!(!f.board.drop_on("B", DropTarget::Column(TaskStatus::Todo)).await.unwrap());
        assert_eq!(f.api.reorder_calls(), 0);
        assert!(f.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_outside_cancels() {
        let mut f = fixture().await;
        let before = f.board.store().tasks().to_vec();
        f.board.on_drag_start("A").unwrap();
        assert!(matches!(f.board.on_drag_end(None), DropOutcome::Unchanged));
        assert_eq!(f.board.phase(), &BoardPhase::Idle);
        assert_eq!(f.board.store().tasks(), before.as_slice());
        assert_eq!(f.api.reorder_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_target_is_ignored() {
        let mut f = fixture().await;
        let before = f.board.store().tasks().to_vec();
        f.board.on_drag_start("A").unwrap();
        let outcome = f.board.on_drag_end(Some(DropTarget::Task("nope".into())));
        assert!(matches!(
            outcome,
            DropOutcome::Ignored(BoardError::Gesture(GestureError::TaskNotFound(_)))
        ));
        assert_eq!(f.board.phase(), &BoardPhase::Idle);
        assert_eq!(f.board.store().tasks(), before.as_slice());
        assert!(f.board.on_drag_start("nope").is_err());
        assert_eq!(f.api.reorder_calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_with_one_notice() {
        let mut f = fixture().await;
        let before = f.board.store().tasks().to_vec();
        f.api.fail_next_reorder("server down");

        f.board.on_drag_start("A").unwrap();
        assert!(matches!(
            f.board.on_drag_end(Some(DropTarget::Column(TaskStatus::Done))),
            DropOutcome::Pending
        ));
        assert_eq!(f.board.store().get("A").unwrap().status, TaskStatus::Done);

        let err = f.board.settle().await.unwrap_err();
        assert!(matches!(err, BoardError::RemoteReorderFailed(_)));
        assert_eq!(f.board.store().tasks(), before.as_slice());
        assert!(f.board.store().error().is_some_and(|e| e.contains("server down")));
        assert_eq!(f.board.last_outcome(), Some(Outcome::RolledBack));
        assert_eq!(f.board.phase(), &BoardPhase::Idle);

        let notices = f.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Failure);
        assert_eq!(notices[0].message, "Failed to move task");
    }

    #[tokio::test]
    async fn test_busy_while_reconciling() {
        let mut f = fixture().await;
        f.board.on_drag_start("A").unwrap();
        assert!(matches!(
            f.board.on_drag_end(Some(DropTarget::Task("B".into()))),
            DropOutcome::Pending
        ));
        assert!(matches!(f.board.on_drag_start("C"), Err(BoardError::Busy)));
        f.board.settle().await.unwrap();
        assert!(f.board.on_drag_start("C").is_ok());
        f.board.on_drag_cancel();
        assert_eq!(f.board.active_task_id(), None);
    }

    #[tokio::test]
    async fn test_discarded_outcome_is_still_settled() {
        let mut f = fixture().await;
        f.board.on_drag_start("A").unwrap();
        let _ = f.board.on_drag_end(Some(DropTarget::Column(TaskStatus::Done)));

        // the batch lives in the controller, not in the dropped outcome
        assert_eq!(f.board.pending().map(|p| p.task_id.as_str()), Some("A"));
        assert!(matches!(f.board.on_drag_start("C"), Err(BoardError::Busy)));
        f.board.settle().await.unwrap();
        assert_eq!(f.api.reorder_calls(), 1);
        assert_eq!(column(&f.board, TaskStatus::Done), pairs(&[("Z", 0), ("A", 1)]));

        f.board.on_drag_start("C").unwrap();
        assert_eq!(f.board.active_task_id(), Some("C"));
    }

    #[tokio::test]
    async fn test_settle_without_drop_does_nothing() {
        let mut f = fixture().await;
        f.board.settle().await.unwrap();
        assert_eq!(f.api.reorder_calls(), 0);
        assert!(f.board.last_outcome().is_none());
        assert!(f.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drag_end_without_start() {
        let mut f = fixture().await;
        assert!(matches!(
            f.board.on_drag_end(Some(DropTarget::Column(TaskStatus::Done))),
            DropOutcome::Ignored(BoardError::NotDragging)
        ));
    }
}
