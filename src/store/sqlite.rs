//! SQLite-backed task repository.
//!
//! One `tasks` table holds every owner's tasks; all owner-scoped operations
//! take the owner explicitly so nothing in the store depends on a global
//! default identity.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use super::schema::apply_schema;
use crate::dates::{day_bounds, upcoming_bounds};
use crate::error::{Result, TaskError};
use crate::model::{ListFilter, NewTask, OwnerId, Priority, Task, TaskPatch, TaskStatus};

/// Database filename within the store directory.
const DB_FILENAME: &str = "tasks.db";

const SELECT_COLS: &str = "SELECT id, owner_id, title, description, due_date, reminder_at, \
     reminder_sent, priority, tags, status, created_at, updated_at FROM tasks";

/// SQLite-backed task repository.
///
/// Thread-safe via an internal `Mutex<Connection>`. All writes are
/// serialized; reads can proceed concurrently with WAL mode on the SQLite
/// side, though we still acquire the mutex for every call for simplicity.
/// No lock is held across an await point: every operation is synchronous
/// once the guard is taken.
pub struct TaskStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl TaskStore {
    /// Open (or create) the task database under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(DB_FILENAME);
        let conn = Connection::open(&db_path)?;
        apply_schema(&conn)?;
        Ok(Self {
            path: Some(db_path),
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store. Used by tests and ad-hoc tooling.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the backing database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| TaskError::Lock(e.to_string()))
    }

    /// Create a task for `owner`, applying defaults and trimming.
    ///
    /// Fails with [`TaskError::Validation`] when the trimmed title is empty;
    /// nothing is persisted in that case.
    pub fn create(&self, owner: &OwnerId, draft: NewTask) -> Result<Task> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("title must not be empty".to_owned()));
        }

        let now = now_epoch_millis();
        let task = Task {
            id: new_task_id(),
            owner_id: owner.as_str().to_owned(),
            title: title.to_owned(),
            description: normalize_description(draft.description),
            due_date: draft.due_date.map(truncate_to_millis),
            reminder_at: draft.reminder_at.map(truncate_to_millis),
            reminder_sent: false,
            priority: draft.priority.unwrap_or_default(),
            tags: normalize_tags(draft.tags.unwrap_or_default()),
            status: draft.status.unwrap_or_default(),
            created_at: millis_to_utc(now),
            updated_at: millis_to_utc(now),
        };

        let tags_json = serde_json::to_string(&task.tags).unwrap_or_else(|_| "[]".to_owned());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks \
             (id, owner_id, title, description, due_date, reminder_at, reminder_sent, \
              priority, tags, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10, ?11)",
            params![
                task.id,
                task.owner_id,
                task.title,
                task.description,
                task.due_date.map(|d| d.timestamp_millis()),
                task.reminder_at.map(|d| d.timestamp_millis()),
                task.priority.as_str(),
                tags_json,
                task.status.as_str(),
                now,
                now
            ],
        )?;

        Ok(task)
    }

    /// Fetch one task by id, scoped to `owner`.
    pub fn find_by_id(&self, owner: &OwnerId, id: &str) -> Result<Task> {
        let conn = self.lock()?;
        let sql = format!("{SELECT_COLS} WHERE id = ?1 AND owner_id = ?2");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![id, owner.as_str()], row_to_task)?;
        match rows.next() {
            Some(task) => Ok(task?),
            None => Err(TaskError::NotFound(id.to_owned())),
        }
    }

    /// List `owner`'s tasks matching the optional filter constraints.
    ///
    /// Ordered by `due_date` ascending (tasks without a due date first, the
    /// document-store missing-first convention), ties broken by `created_at`
    /// descending so the newest of same-day tasks lists first.
    pub fn find_by_filter(&self, owner: &OwnerId, filter: &ListFilter) -> Result<Vec<Task>> {
        let mut sql = format!("{SELECT_COLS} WHERE owner_id = ?1");
        let mut values: Vec<Value> = vec![Value::Text(owner.as_str().to_owned())];

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_owned()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(priority) = filter.priority {
            values.push(Value::Text(priority.as_str().to_owned()));
            sql.push_str(&format!(" AND priority = ?{}", values.len()));
        }
        if let Some(tag) = &filter.tag {
            // Tags are a JSON array; match the serialized element form.
            values.push(Value::Text(format!("%\"{}\"%", tag.trim())));
            sql.push_str(&format!(" AND tags LIKE ?{}", values.len()));
        }

        sql.push_str(" ORDER BY due_date ASC, created_at DESC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_task)?;
        collect_tasks(rows)
    }

    /// Apply a partial update to `owner`'s task.
    ///
    /// Only supplied fields change. Supplying `reminder_at`, whether null or
    /// not, forces `reminder_sent` back to false: a new reminder time means
    /// the old "sent" fact no longer applies.
    pub fn update(&self, owner: &OwnerId, id: &str, patch: TaskPatch) -> Result<Task> {
        let mut set_clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        let push = |clauses: &mut Vec<String>, values: &mut Vec<Value>, col: &str, v: Value| {
            values.push(v);
            clauses.push(format!("{col} = ?{}", values.len()));
        };

        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(TaskError::Validation("title must not be empty".to_owned()));
            }
            push(
                &mut set_clauses,
                &mut values,
                "title",
                Value::Text(title.to_owned()),
            );
        }
        if let Some(description) = &patch.description {
            let value = match normalize_description(description.clone()) {
                Some(d) => Value::Text(d),
                None => Value::Null,
            };
            push(&mut set_clauses, &mut values, "description", value);
        }
        if let Some(due_date) = &patch.due_date {
            let value = due_date
                .map(|d| Value::Integer(d.timestamp_millis()))
                .unwrap_or(Value::Null);
            push(&mut set_clauses, &mut values, "due_date", value);
        }
        if let Some(reminder_at) = &patch.reminder_at {
            let value = reminder_at
                .map(|d| Value::Integer(d.timestamp_millis()))
                .unwrap_or(Value::Null);
            push(&mut set_clauses, &mut values, "reminder_at", value);
            set_clauses.push("reminder_sent = 0".to_owned());
        }
        if let Some(priority) = patch.priority {
            push(
                &mut set_clauses,
                &mut values,
                "priority",
                Value::Text(priority.as_str().to_owned()),
            );
        }
        if let Some(tags) = patch.tags {
            let tags_json = serde_json::to_string(&normalize_tags(tags))
                .unwrap_or_else(|_| "[]".to_owned());
            push(&mut set_clauses, &mut values, "tags", Value::Text(tags_json));
        }
        if let Some(status) = patch.status {
            push(
                &mut set_clauses,
                &mut values,
                "status",
                Value::Text(status.as_str().to_owned()),
            );
        }

        push(
            &mut set_clauses,
            &mut values,
            "updated_at",
            Value::Integer(now_epoch_millis()),
        );

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ?{} AND owner_id = ?{}",
            set_clauses.join(", "),
            values.len() + 1,
            values.len() + 2,
        );
        values.push(Value::Text(id.to_owned()));
        values.push(Value::Text(owner.as_str().to_owned()));

        {
            let conn = self.lock()?;
            let rows = conn.execute(&sql, params_from_iter(values))?;
            if rows == 0 {
                return Err(TaskError::NotFound(id.to_owned()));
            }
        }

        self.find_by_id(owner, id)
    }

    /// Delete `owner`'s task. Returns the affected-row count (0 or 1); the
    /// caller maps 0 to a not-found response.
    pub fn delete(&self, owner: &OwnerId, id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id, owner.as_str()],
        )?;
        Ok(rows)
    }

    /// Tasks due within the calendar day containing `now`, any status.
    pub fn due_today<Tz: TimeZone>(&self, owner: &OwnerId, now: &DateTime<Tz>) -> Result<Vec<Task>> {
        let (start, end) = day_bounds(now);
        self.due_between(owner, start, end, None)
    }

    /// Pending tasks whose due date is strictly in the past.
    pub fn overdue(&self, owner: &OwnerId, now: &DateTime<Utc>) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        let sql = format!(
            "{SELECT_COLS} WHERE owner_id = ?1 AND due_date IS NOT NULL AND due_date < ?2 \
             AND status = 'pending' ORDER BY due_date ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![owner.as_str(), now.timestamp_millis()],
            row_to_task,
        )?;
        collect_tasks(rows)
    }

    /// Pending tasks due in the seven-day window starting today.
    pub fn upcoming<Tz: TimeZone>(&self, owner: &OwnerId, now: &DateTime<Tz>) -> Result<Vec<Task>> {
        let (start, end) = upcoming_bounds(now);
        self.due_between(owner, start, end, Some(TaskStatus::Pending))
    }

    fn due_between(
        &self,
        owner: &OwnerId,
        start: i64,
        end: i64,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        let mut sql = format!(
            "{SELECT_COLS} WHERE owner_id = ?1 AND due_date IS NOT NULL \
             AND due_date BETWEEN ?2 AND ?3"
        );
        if let Some(status) = status {
            sql.push_str(&format!(" AND status = '{}'", status.as_str()));
        }
        sql.push_str(" ORDER BY due_date ASC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner.as_str(), start, end], row_to_task)?;
        collect_tasks(rows)
    }

    /// Tasks in the Due state for the reminder dispatch scan: reminder time
    /// passed, not yet dispatched, still pending. Deliberately not
    /// owner-scoped; the loop sweeps the whole store. Done tasks are
    /// excluded inside the query, never post-filtered.
    pub fn due_reminders(&self, now: &DateTime<Utc>) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        let sql = format!(
            "{SELECT_COLS} WHERE reminder_at IS NOT NULL AND reminder_at <= ?1 \
             AND reminder_sent = 0 AND status = 'pending' ORDER BY reminder_at ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![now.timestamp_millis()], row_to_task)?;
        collect_tasks(rows)
    }

    /// Flip `reminder_sent` to true. The only false-to-true path; the update
    /// patch never touches this flag.
    pub fn mark_reminder_sent(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE tasks SET reminder_sent = 1, updated_at = ?1 WHERE id = ?2",
            params![now_epoch_millis(), id],
        )?;
        if rows == 0 {
            return Err(TaskError::NotFound(id.to_owned()));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Timestamps are stored at millisecond precision; truncate on the way in
/// so the created response and later reads agree exactly.
fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    millis_to_utc(dt.timestamp_millis())
}

fn new_task_id() -> String {
    format!("task-{}", uuid::Uuid::new_v4())
}

/// Trim every tag, dropping entries that trim to nothing. Order and
/// duplicates are preserved.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

fn collect_tasks(rows: impl Iterator<Item = rusqlite::Result<Task>>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    Ok(tasks)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let due_ms: Option<i64> = row.get(4)?;
    let reminder_ms: Option<i64> = row.get(5)?;
    let priority_str: String = row.get(7)?;
    let tags_json: String = row.get(8)?;
    let status_str: String = row.get(9)?;
    let created_ms: i64 = row.get(10)?;
    let updated_ms: i64 = row.get(11)?;

    Ok(Task {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: due_ms.map(millis_to_utc),
        reminder_at: reminder_ms.map(millis_to_utc),
        reminder_sent: row.get(6)?,
        priority: str_to_priority(&priority_str),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        status: str_to_status(&status_str),
        created_at: millis_to_utc(created_ms),
        updated_at: millis_to_utc(updated_ms),
    })
}

fn str_to_priority(s: &str) -> Priority {
    match s {
        "low" => Priority::Low,
        "high" => Priority::High,
        _ => Priority::Medium, // safe fallback
    }
}

fn str_to_status(s: &str) -> TaskStatus {
    match s {
        "done" => TaskStatus::Done,
        _ => TaskStatus::Pending, // safe fallback
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
