//! Per-user filter tuples.

use std::sync::Arc;

use crate::core::error::{AppError, AppResult};
use crate::quiz::field::ClassificationField;
use crate::quiz::model::FilterState;
use crate::storage::db::{get_connection, DbConnection, DbPool};
use crate::storage::sessions::{clear_filters, insert_default_filters, load_filters, set_filter_column};

/// Reads and writes the `filter_sessions` row of each user.
#[derive(Clone)]
pub struct FilterSessionManager {
    pool: Arc<DbPool>,
}

impl FilterSessionManager {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Returns the user's tuple, creating an all-unset row on first access.
    pub fn get_or_create(&self, user_id: i64) -> AppResult<FilterState> {
        let conn = get_connection(&self.pool)?;
        Self::ensure(&conn, user_id)
    }

    /// Overwrites one field. `None` clears it.
    pub fn update(&self, user_id: i64, field: ClassificationField, value: Option<String>) -> AppResult<FilterState> {
        let mut conn = get_connection(&self.pool)?;
        let tx = conn.transaction()?;
        insert_default_filters(&tx, user_id)?;
        set_filter_column(&tx, user_id, field, value.as_deref())?;
        let state = load_filters(&tx, user_id)?.unwrap_or_else(|| FilterState::unconstrained(user_id));
        tx.commit()?;

        log::debug!("User {} set {} = {:?}", user_id, field, value);
        Ok(state)
    }

    /// Same as [`update`](Self::update) for a field given by name.
    ///
    /// Names outside the six classification fields fail with
    /// [`AppError::UnknownField`] and leave the row untouched.
    pub fn update_by_name(&self, user_id: i64, field_name: &str, value: Option<String>) -> AppResult<FilterState> {
        let field = ClassificationField::parse(field_name).inspect_err(|_| {
            log::warn!("User {} tried to set unknown filter field {:?}", user_id, field_name);
        })?;
        self.update(user_id, field, value)
    }

    /// Clears all six fields.
    pub fn reset(&self, user_id: i64) -> AppResult<FilterState> {
        let conn = get_connection(&self.pool)?;
        if !insert_default_filters(&conn, user_id)? {
            clear_filters(&conn, user_id)?;
        }
        log::debug!("User {} reset filters", user_id);
        Ok(FilterState::unconstrained(user_id))
    }

    fn ensure(conn: &DbConnection, user_id: i64) -> AppResult<FilterState> {
        if insert_default_filters(conn, user_id)? {
            log::debug!("Created filter row for user {}", user_id);
        }
        load_filters(conn, user_id)?
            .ok_or_else(|| AppError::Validation(format!("filter row for user {user_id} vanished")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::create_memory_pool;
    use pretty_assertions::assert_eq;

    fn manager() -> FilterSessionManager {
        FilterSessionManager::new(Arc::new(create_memory_pool().unwrap()))
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let filters = manager();
        let first = filters.get_or_create(7).unwrap();
        let second = filters.get_or_create(7).unwrap();
        assert_eq!(first, second);
        assert!(first.is_unconstrained());
    }

    #[test]
    fn update_overwrites_and_clears() {
        let filters = manager();
        let state = filters.update(7, ClassificationField::Board, Some("CBSE".into())).unwrap();
        assert_eq!(state.constraint(ClassificationField::Board), Some("CBSE"));

        let state = filters.update(7, ClassificationField::Board, None).unwrap();
        assert_eq!(state.constraint(ClassificationField::Board), None);
    }

    #[test]
    fn update_by_unknown_name_changes_nothing() {
        let filters = manager();
        filters.update(7, ClassificationField::Exam, Some("Talati".into())).unwrap();

        let err = filters.update_by_name(7, "chapter", Some("x".into())).unwrap_err();
        assert!(matches!(err, AppError::UnknownField(name) if name == "chapter"));
        assert_eq!(
            filters.get_or_create(7).unwrap().constraint(ClassificationField::Exam),
            Some("Talati")
        );
    }

    #[test]
    fn reset_clears_every_field() {
        let filters = manager();
        for field in ClassificationField::all() {
            filters.update(7, field, Some(format!("{field}-value"))).unwrap();
        }
        filters.reset(7).unwrap();
        assert_eq!(filters.get_or_create(7).unwrap(), FilterState::unconstrained(7));

        // Reset of a user never seen before also yields an unset row
        assert_eq!(filters.reset(8).unwrap(), FilterState::unconstrained(8));
        assert_eq!(filters.get_or_create(8).unwrap(), FilterState::unconstrained(8));
    }
}
