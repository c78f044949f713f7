use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::models::{ListFilter, Task};

const TASK_COLUMNS: &str = "id, title, description, is_done, parent_id, category, is_today, \
     position, created_at, updated_at, completed_at";

/// Column values for a freshly created task.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub parent_id: Option<i64>,
    pub category: Option<&'a str>,
    pub is_today: bool,
    pub position: i64,
    pub now: &'a str,
}

pub async fn insert_task(conn: &mut SqliteConnection, task: &NewTask<'_>) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO tasks
            (title, description, is_done, parent_id, category, is_today,
            position, created_at, updated_at, completed_at)
        VALUES (?1, '', 0, ?2, ?3, ?4, ?5, ?6, ?6, NULL)
        "#,
    )
    .bind(task.title)
    .bind(task.parent_id)
    .bind(task.category)
    .bind(task.is_today)
    .bind(task.position)
    .bind(task.now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_task_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn task_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub async fn fetch_all_tasks(conn: &mut SqliteConnection) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks ORDER BY position, id"
    ))
    .fetch_all(&mut *conn)
    .await
}

pub async fn fetch_children(conn: &mut SqliteConnection, parent_id: i64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE parent_id = ? ORDER BY position, id"
    ))
    .bind(parent_id)
    .fetch_all(&mut *conn)
    .await
}

/// Root-level tasks matching the filter, ordered by `(position, id)`.
pub async fn fetch_roots(conn: &mut SqliteConnection, filter: &ListFilter) -> Result<Vec<Task>, sqlx::Error> {
    let base = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE parent_id IS NULL");
    let order = "ORDER BY position, id";

    match filter {
        ListFilter::All => {
            sqlx::query_as::<_, Task>(&format!("{base} {order}"))
                .fetch_all(&mut *conn)
                .await
        }
        ListFilter::MyDay => {
            sqlx::query_as::<_, Task>(&format!("{base} AND is_today = 1 {order}"))
                .fetch_all(&mut *conn)
                .await
        }
        ListFilter::Inbox => {
            sqlx::query_as::<_, Task>(&format!(
                "{base} AND (category IS NULL OR category = '') {order}"
            ))
            .fetch_all(&mut *conn)
            .await
        }
        ListFilter::Category(category) => {
            sqlx::query_as::<_, Task>(&format!("{base} AND category = ? {order}"))
                .bind(category)
                .fetch_all(&mut *conn)
                .await
        }
    }
}

pub async fn distinct_categories(conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT DISTINCT category
        FROM tasks
        WHERE category IS NOT NULL AND category != ''
        ORDER BY category
        "#,
    )
    .fetch_all(&mut *conn)
    .await
}

/// Position that appends a new task after its existing siblings.
pub async fn next_position(conn: &mut SqliteConnection, parent_id: Option<i64>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE parent_id IS ?")
        .bind(parent_id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn update_title(conn: &mut SqliteConnection, id: i64, title: &str, now: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tasks SET title = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(title)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn update_description(
    conn: &mut SqliteConnection,
    id: i64,
    description: &str,
    now: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tasks SET description = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(description)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Sets the done flag, stamping `completed_at` when done and clearing it otherwise.
pub async fn set_done(conn: &mut SqliteConnection, id: i64, is_done: bool, now: &str) -> Result<bool, sqlx::Error> {
    let completed_at = is_done.then_some(now);
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET is_done = ?1,
            completed_at = ?2,
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(is_done)
    .bind(completed_at)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn set_today(conn: &mut SqliteConnection, id: i64, is_today: bool, now: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tasks SET is_today = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(is_today)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn set_position(conn: &mut SqliteConnection, id: i64, position: i64, now: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(position)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_task(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Clears the today flag on every flagged task, returning how many were cleared.
pub async fn clear_today_flags(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE tasks SET is_today = 0 WHERE is_today = 1")
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(result)
}

pub async fn last_reset_date(conn: &mut SqliteConnection) -> Result<Option<NaiveDate>, sqlx::Error> {
    let raw: Option<String> =
        sqlx::query_scalar("SELECT last_reset_date FROM rollover_state WHERE id = 1")
            .fetch_optional(&mut *conn)
            .await?;

    Ok(raw.and_then(|s| s.parse().ok()))
}

pub async fn record_reset_date(conn: &mut SqliteConnection, date: NaiveDate) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO rollover_state (id, last_reset_date)
        VALUES (1, ?1)
        ON CONFLICT(id) DO UPDATE SET last_reset_date = excluded.last_reset_date
        "#,
    )
    .bind(date.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
