use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::repository::{self, NewTask};
use crate::error::AppError;
use crate::models::{AddTaskRequest, ListFilter, ListedTask, Progress, TaskDetail, TaskNode};
use crate::services::tree::TaskArena;

/// Everything the index page needs in one read.
#[derive(Debug)]
pub struct Overview {
    pub tasks: Vec<TaskNode>,
    pub categories: Vec<String>,
    pub progress: HashMap<i64, Progress>,
}

/// Task reads and mutations. Each call runs in a single transaction on its
/// own pooled connection.
#[derive(Clone)]
pub struct TaskService {
    db: SqlitePool,
}

impl TaskService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn add(&self, req: AddTaskRequest) -> Result<i64, AppError> {
        let title = validate_title(&req.title)?;
        let category = req
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;

        if let Some(parent_id) = req.parent_id {
            if !repository::task_exists(&mut tx, parent_id).await? {
                return Err(AppError::TaskNotFound(parent_id));
            }
        }

        let position = repository::next_position(&mut tx, req.parent_id).await?;
        let id = repository::insert_task(
            &mut tx,
            &NewTask {
                title,
                parent_id: req.parent_id,
                category,
                is_today: req.is_today,
                position,
                now: &now,
            },
        )
        .await?;

        tx.commit().await?;
        debug!("added task {} (parent: {:?})", id, req.parent_id);
        Ok(id)
    }

    pub async fn rename(&self, id: i64, title: &str) -> Result<(), AppError> {
        let title = validate_title(title)?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        if !repository::update_title(&mut tx, id, title, &now).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tx.commit().await?;

        debug!("renamed task {}", id);
        Ok(())
    }

    pub async fn update_description(&self, id: i64, description: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        if !repository::update_description(&mut tx, id, description, &now).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tx.commit().await?;

        debug!("updated description of task {}", id);
        Ok(())
    }

    /// Flips the done flag and returns the new value.
    pub async fn toggle_done(&self, id: i64) -> Result<bool, AppError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        let task = repository::find_task_by_id(&mut tx, id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;
        let is_done = !task.is_done;
        repository::set_done(&mut tx, id, is_done, &now).await?;
        tx.commit().await?;

        debug!("task {} is_done = {}", id, is_done);
        Ok(is_done)
    }

    pub async fn set_today(&self, id: i64, is_today: Option<bool>) -> Result<bool, AppError> {
        let is_today =
            is_today.ok_or_else(|| AppError::BadRequest("is_today is required".to_string()))?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        if !repository::set_today(&mut tx, id, is_today, &now).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tx.commit().await?;

        debug!("task {} is_today = {}", id, is_today);
        Ok(is_today)
    }

    pub async fn set_position(&self, id: i64, position: Option<i64>) -> Result<i64, AppError> {
        let position =
            position.ok_or_else(|| AppError::BadRequest("position is required".to_string()))?;
        let now = Utc::now().to_rfc3339();

        let mut tx = self.db.begin().await?;
        if !repository::set_position(&mut tx, id, position, &now).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tx.commit().await?;

        Ok(position)
    }

    /// Removes the task and its whole subtree in one transaction, deepest
    /// tasks first. Returns the number of rows deleted.
    pub async fn delete(&self, id: Option<i64>) -> Result<u64, AppError> {
        let id = id.ok_or_else(|| AppError::BadRequest("id is required".to_string()))?;

        let mut tx = self.db.begin().await?;
        let arena = TaskArena::new(repository::fetch_all_tasks(&mut tx).await?);
        if arena.get(id).is_none() {
            return Err(AppError::TaskNotFound(id));
        }

        let mut deleted = 0;
        for task_id in arena.descendants_post_order(id) {
            if repository::delete_task(&mut tx, task_id).await? {
                deleted += 1;
            }
        }
        tx.commit().await?;

        debug!("deleted task {} and {} descendants", id, deleted - 1);
        Ok(deleted)
    }

    /// Task with its immediate children and progress, read in one transaction.
    pub async fn detail(&self, id: i64) -> Result<TaskDetail, AppError> {
        let mut tx = self.db.begin().await?;
        let task = repository::find_task_by_id(&mut tx, id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;
        let children = repository::fetch_children(&mut tx, id).await?;
        let arena = TaskArena::new(repository::fetch_all_tasks(&mut tx).await?);
        tx.commit().await?;

        Ok(TaskDetail {
            progress: arena.progress(id),
            task,
            children,
        })
    }

    pub async fn distinct_categories(&self) -> Result<Vec<String>, AppError> {
        let mut conn = self.db.acquire().await?;
        Ok(repository::distinct_categories(&mut conn).await?)
    }

    /// Root-level tasks matching `filter` followed by their descendants, as
    /// flat rows with parents ahead of their children.
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<ListedTask>, AppError> {
        let mut tx = self.db.begin().await?;
        let roots = repository::fetch_roots(&mut tx, filter).await?;
        let arena = TaskArena::new(repository::fetch_all_tasks(&mut tx).await?);
        tx.commit().await?;

        let root_ids: Vec<i64> = roots.iter().map(|t| t.id).collect();
        Ok(arena.flatten(&root_ids))
    }

    pub async fn overview(&self) -> Result<Overview, AppError> {
        let mut tx = self.db.begin().await?;
        let arena = TaskArena::new(repository::fetch_all_tasks(&mut tx).await?);
        let categories = repository::distinct_categories(&mut tx).await?;
        tx.commit().await?;

        Ok(Overview {
            tasks: arena.subtree(None),
            progress: arena.all_progress(),
            categories,
        })
    }
}

fn validate_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    Ok(trimmed)
}
