use sqlx::SqlitePool;

use crate::services::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        let tasks = TaskService::new(db.clone());
        Self { db, tasks }
    }
}
