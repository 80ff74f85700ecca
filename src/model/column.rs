use super::task::{Task, TaskStatus};

/// One board column: the tasks of a single status, in render order.
///
/// Columns borrow from the store's task list; they are rebuilt on every
/// render and never written through.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

impl<'a> Column<'a> {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Index of a task within this column
    pub fn index_of(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Find the column with the given status
pub fn column_for<'c, 'a>(columns: &'c [Column<'a>], status: TaskStatus) -> Option<&'c Column<'a>> {
    columns.iter().find(|c| c.status == status)
}

/// Locate a task across all columns: `(column index, row index, task)`
pub fn locate<'a>(columns: &[Column<'a>], task_id: &str) -> Option<(usize, usize, &'a Task)> {
    columns.iter().enumerate().find_map(|(ci, col)| {
        col.tasks
            .iter()
            .position(|t| t.id == task_id)
            .map(|ri| (ci, ri, col.tasks[ri]))
    })
}
