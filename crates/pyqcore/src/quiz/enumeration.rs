//! Cascading enumeration of classification values.

use crate::quiz::field::ClassificationField;
use crate::quiz::model::FilterState;
use crate::storage::records::distinct_values;
use rusqlite::Connection;

/// Distinct values of `field` that still lead to at least one record under
/// the other five fields of `filters`.
///
/// The current value of `field` itself never constrains the result. Values
/// are never empty and come back in ascending lexicographic order.
pub fn enumerate(conn: &Connection, field: ClassificationField, filters: &FilterState) -> rusqlite::Result<Vec<String>> {
    let constraints = filters.constraints_excluding(field);
    let values = distinct_values(conn, field, &constraints)?;
    if values.is_empty() {
        log::debug!(
            "No {} for user {} under {} constraint(s)",
            field.plural(),
            filters.user_id,
            constraints.len()
        );
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::model::{Classification, NewRecord};
    use crate::storage::db::{create_memory_pool, get_connection};
    use crate::storage::records::insert_record;
    use pretty_assertions::assert_eq;

    fn record(board: &str, year: &str, topic: Option<&str>) -> NewRecord {
        NewRecord {
            classification: Classification {
                board: Some(board.to_string()),
                year: Some(year.to_string()),
                topic: topic.map(str::to_string),
                ..Classification::default()
            },
            question_text: "Q".to_string(),
            options: ["a", "b", "c", "d"].map(String::from),
            correct_option: 1,
            explanation: None,
        }
    }

    #[test]
    fn field_never_constrains_itself() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        insert_record(&conn, &record("GSEB", "2021", Some("Rivers"))).unwrap();
        insert_record(&conn, &record("CBSE", "2023", Some("Constitution"))).unwrap();
        insert_record(&conn, &record("CBSE", "2022", Some(""))).unwrap();
        insert_record(&conn, &record("CBSE", "2022", None)).unwrap();

        let mut filters = FilterState::unconstrained(1);
        filters.values.board = Some("CBSE".to_string());

        let with_own = enumerate(&conn, ClassificationField::Board, &filters).unwrap();
        filters.values.board = None;
        let without_own = enumerate(&conn, ClassificationField::Board, &filters).unwrap();
        assert_eq!(with_own, vec!["CBSE", "GSEB"]);
        assert_eq!(with_own, without_own);
    }

    #[test]
    fn other_fields_narrow_and_blank_values_are_skipped() {
        let pool = create_memory_pool().unwrap();
        let conn = get_connection(&pool).unwrap();
        insert_record(&conn, &record("GSEB", "2021", Some("Rivers"))).unwrap();
        insert_record(&conn, &record("CBSE", "2023", Some("Constitution"))).unwrap();
        insert_record(&conn, &record("CBSE", "2023", Some("Constitution"))).unwrap();
        insert_record(&conn, &record("CBSE", "2022", Some(""))).unwrap();
        insert_record(&conn, &record("CBSE", "2020", None)).unwrap();

        let mut filters = FilterState::unconstrained(1);
        filters.values.board = Some("CBSE".to_string());
        assert_eq!(
            enumerate(&conn, ClassificationField::Topic, &filters).unwrap(),
            vec!["Constitution"]
        );
        assert_eq!(
            enumerate(&conn, ClassificationField::Year, &filters).unwrap(),
            vec!["2020", "2022", "2023"]
        );

        filters.values.year = Some("1999".to_string());
        assert!(enumerate(&conn, ClassificationField::Topic, &filters).unwrap().is_empty());
    }
}
