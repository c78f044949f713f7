use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_done: bool,
    pub parent_id: Option<i64>,
    pub category: Option<String>,
    pub is_today: bool,
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// A task together with its nested descendants.
#[derive(Debug)]
pub struct TaskNode {
    pub task: Task,
    pub children: Vec<TaskNode>,
}

impl Drop for TaskNode {
    // Unlinks descendants onto a heap stack so a deep chain is freed in a loop.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// One row of a flattened listing.
///
/// Rows are emitted parents first, so a client can rebuild the nesting from
/// `parent_id` in a single pass.
#[derive(Debug, Clone, Serialize)]
pub struct ListedTask {
    #[serde(flatten)]
    pub task: Task,
    pub progress: Progress,
}

/// Completion summary for a task.
///
/// Leaves report their own `done` flag; parents report `done: null` and the
/// number of direct children in `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: Option<u8>,
    pub total: usize,
    pub percent: u32,
}

impl Progress {
    pub fn missing() -> Self {
        Self { done: None, total: 0, percent: 0 }
    }

    pub fn leaf(is_done: bool) -> Self {
        Self {
            done: Some(u8::from(is_done)),
            total: 1,
            percent: if is_done { 100 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub children: Vec<Task>,
    pub progress: Progress,
}

/// Root-level list selector used by `/api/list/{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    MyDay,
    Inbox,
    Category(String),
}

impl ListFilter {
    pub fn from_name(name: &str) -> Self {
        match name {
            "all" => ListFilter::All,
            "myday" => ListFilter::MyDay,
            "inbox" => ListFilter::Inbox,
            other => ListFilter::Category(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTaskRequest {
    #[serde(default)]
    pub title: String,
    pub parent_id: Option<i64>,
    pub category: Option<String>,
    #[serde(default)]
    pub is_today: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTitleRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDescriptionRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetTodayRequest {
    pub is_today: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetPositionRequest {
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    pub id: Option<i64>,
}
