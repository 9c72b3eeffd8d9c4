//! Per-user session rows: wizard progress and filter tuples.

use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;

use crate::core::error::{AppError, AppResult};
use crate::quiz::field::ClassificationField;
use crate::quiz::model::{Classification, FilterState};
use crate::quiz::wizard::{ConversationState, RecordDraft, WizardStep};
use crate::storage::db::{get_connection, DbPool};

/// Keyed storage for wizard progress.
///
/// Implementations only store and load; the wizard decides what to write.
pub trait SessionStore: Send + Sync {
    /// Current state of `user_id`, `None` when the user never started a wizard
    /// or the slot was deleted.
    fn get(&self, user_id: i64) -> AppResult<Option<ConversationState>>;

    /// Replaces the whole slot of `user_id`.
    fn put(&self, user_id: i64, state: &ConversationState) -> AppResult<()>;

    fn delete(&self, user_id: i64) -> AppResult<()>;
}

/// Durable store backed by the `conversation_sessions` table.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Arc<DbPool>,
}

impl SqliteSessionStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, user_id: i64) -> AppResult<Option<ConversationState>> {
        let conn = get_connection(&self.pool)?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT step, draft FROM conversation_sessions WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((step, draft)) = row else {
            return Ok(None);
        };
        let step = step
            .parse::<WizardStep>()
            .map_err(|_| AppError::Validation(format!("stored wizard step {step:?} is not recognized")))?;
        let draft: RecordDraft = serde_json::from_str(&draft)?;
        Ok(Some(ConversationState { step, draft }))
    }

    fn put(&self, user_id: i64, state: &ConversationState) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        let draft = serde_json::to_string(&state.draft)?;
        conn.execute(
            "INSERT INTO conversation_sessions (user_id, step, draft, updated_at)
             VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
             ON CONFLICT(user_id) DO UPDATE SET
               step = excluded.step,
               draft = excluded.draft,
               updated_at = CURRENT_TIMESTAMP",
            params![user_id, state.step.as_ref(), draft],
        )?;
        Ok(())
    }

    fn delete(&self, user_id: i64) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute("DELETE FROM conversation_sessions WHERE user_id = ?1", params![user_id])?;
        Ok(())
    }
}

/// Process-local store, for tests and deployments that accept losing
/// in-flight wizards on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slots: Arc<DashMap<i64, ConversationState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: i64) -> AppResult<Option<ConversationState>> {
        Ok(self.slots.get(&user_id).map(|slot| slot.value().clone()))
    }

    fn put(&self, user_id: i64, state: &ConversationState) -> AppResult<()> {
        self.slots.insert(user_id, state.clone());
        Ok(())
    }

    fn delete(&self, user_id: i64) -> AppResult<()> {
        self.slots.remove(&user_id);
        Ok(())
    }
}

// ── filter_sessions ──────────────────────────────────────────────────────────

/// Load the filter row of `user_id`, if any.
pub fn load_filters(conn: &Connection, user_id: i64) -> rusqlite::Result<Option<FilterState>> {
    conn.query_row(
        "SELECT board, year, exam, subject, topic, subtopic FROM filter_sessions WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(FilterState {
                user_id,
                values: Classification {
                    board: row.get(0)?,
                    year: row.get(1)?,
                    exam: row.get(2)?,
                    subject: row.get(3)?,
                    topic: row.get(4)?,
                    subtopic: row.get(5)?,
                },
            })
        },
    )
    .optional()
}

/// Create an all-null row for `user_id` unless one exists.
/// Returns true when a row was inserted.
pub fn insert_default_filters(conn: &Connection, user_id: i64) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO filter_sessions (user_id, board, year, exam, subject, topic, subtopic)
         VALUES (?1, NULL, NULL, NULL, NULL, NULL, NULL)",
        params![user_id],
    )?;
    Ok(inserted > 0)
}

/// Overwrite one column of the row. Returns the number of rows touched.
pub fn set_filter_column(
    conn: &Connection,
    user_id: i64,
    field: ClassificationField,
    value: Option<&str>,
) -> rusqlite::Result<usize> {
    let sql = format!("UPDATE filter_sessions SET {} = ?1 WHERE user_id = ?2", field.column());
    conn.execute(&sql, params![value, user_id])
}

/// Null all six columns of the row.
pub fn clear_filters(conn: &Connection, user_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE filter_sessions
         SET board = NULL, year = NULL, exam = NULL,
             subject = NULL, topic = NULL, subtopic = NULL
         WHERE user_id = ?1",
        params![user_id],
    )
}
