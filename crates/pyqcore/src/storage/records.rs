//! Record repository: the `records` table.
//!
//! Only [`insert_record`] mutates the table; there is no update or delete
//! path. Query helpers build their `WHERE` clause from
//! [`ClassificationField::column`] names and bind every value.

use itertools::Itertools;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::quiz::field::ClassificationField;
use crate::quiz::model::{Classification, ClassificationRecord, NewRecord};

/// Equality constraints on classification columns
pub type Constraints<'a> = [(ClassificationField, &'a str)];

const RECORD_COLUMNS: &str = "id, board, year, exam, subject, topic, subtopic, question_text,
     option1, option2, option3, option4, correct_option, explanation";

fn parse_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClassificationRecord> {
    Ok(ClassificationRecord {
        id: row.get(0)?,
        classification: Classification {
            board: row.get(1)?,
            year: row.get(2)?,
            exam: row.get(3)?,
            subject: row.get(4)?,
            topic: row.get(5)?,
            subtopic: row.get(6)?,
        },
        question_text: row.get(7)?,
        options: [row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?],
        correct_option: row.get::<_, u8>(12)?,
        explanation: row.get(13)?,
    })
}

/// Builds `WHERE a = ? AND b = ? AND <extra...>` plus the bound values.
fn where_clause<'a>(constraints: &Constraints<'a>, extra: &[String]) -> (String, Vec<&'a str>) {
    let clauses = constraints
        .iter()
        .map(|(field, _)| format!("{} = ?", field.column()))
        .chain(extra.iter().cloned())
        .collect::<Vec<_>>();
    let values = constraints.iter().map(|(_, value)| *value).collect();

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

/// Inserts a validated record and returns its generated id.
pub fn insert_record(conn: &Connection, record: &NewRecord) -> rusqlite::Result<i64> {
    let c = &record.classification;
    conn.execute(
        "INSERT INTO records (
            board, year, exam, subject, topic, subtopic,
            question_text,
            option1, option2, option3, option4,
            correct_option, explanation
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            c.board,
            c.year,
            c.exam,
            c.subject,
            c.topic,
            c.subtopic,
            record.question_text,
            record.options[0],
            record.options[1],
            record.options[2],
            record.options[3],
            record.correct_option,
            record.explanation,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Distinct non-null, non-empty values of `field` among records matching
/// `constraints`, in ascending lexicographic order.
pub fn distinct_values(
    conn: &Connection,
    field: ClassificationField,
    constraints: &Constraints<'_>,
) -> rusqlite::Result<Vec<String>> {
    let column = field.column();
    let (where_sql, values) = where_clause(
        constraints,
        &[format!("{column} IS NOT NULL"), format!("{column} != ''")],
    );
    let sql = format!("SELECT DISTINCT {column} FROM records {where_sql} ORDER BY {column} ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Ids of every record matching `constraints`, ascending.
pub fn matching_ids(conn: &Connection, constraints: &Constraints<'_>) -> rusqlite::Result<Vec<i64>> {
    let (where_sql, values) = where_clause(constraints, &[]);
    let sql = format!("SELECT id FROM records {where_sql} ORDER BY id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, i64>(0))?;
    rows.collect()
}

/// Loads records by id, preserving the order of `ids`. Unknown ids are skipped.
pub fn get_records_by_ids(conn: &Connection, ids: &[i64]) -> rusqlite::Result<Vec<ClassificationRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").join(", ");
    let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE id IN ({placeholders})");

    let mut stmt = conn.prepare(&sql)?;
    let mut found = stmt
        .query_map(params_from_iter(ids.iter()), parse_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    found.sort_by_key(|record| ids.iter().position(|id| *id == record.id));
    Ok(found)
}

/// Get a single record by id.
pub fn get_record(conn: &Connection, id: i64) -> rusqlite::Result<Option<ClassificationRecord>> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
        params![id],
        parse_row,
    )
    .optional()
}

/// Total number of stored records.
pub fn count_records(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations;
    use pretty_assertions::assert_eq;

    fn make_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn record(board: &str, topic: &str, subtopic: &str) -> NewRecord {
        NewRecord {
            classification: Classification {
                board: Some(board.to_string()),
                year: Some("2023".to_string()),
                exam: Some("Talati".to_string()),
                subject: Some("Polity".to_string()),
                topic: Some(topic.to_string()),
                subtopic: Some(subtopic.to_string()),
            },
            question_text: format!("{board} {topic}?"),
            options: ["O1", "O2", "O3", "O4"].map(String::from),
            correct_option: 2,
            explanation: None,
        }
    }

    #[test]
    fn insert_returns_increasing_ids_and_round_trips() {
        let conn = make_conn();
        let first = insert_record(&conn, &record("CBSE", "Constitution", "")).unwrap();
        let second = insert_record(&conn, &record("GSEB", "Rights", "Art. 21")).unwrap();
        assert!(second > first);

        let stored = get_record(&conn, second).unwrap().expect("must exist");
        assert_eq!(stored.classification.board.as_deref(), Some("GSEB"));
        assert_eq!(stored.options[1], "O2");
        assert_eq!(stored.correct_index(), 1);
        assert_eq!(count_records(&conn).unwrap(), 2);
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_empty() {
        let conn = make_conn();
        insert_record(&conn, &record("GSEB", "Rights", "")).unwrap();
        insert_record(&conn, &record("CBSE", "Constitution", "Preamble")).unwrap();
        insert_record(&conn, &record("CBSE", "Constitution", "")).unwrap();

        let boards = distinct_values(&conn, ClassificationField::Board, &[]).unwrap();
        assert_eq!(boards, vec!["CBSE", "GSEB"]);

        let subtopics = distinct_values(&conn, ClassificationField::Subtopic, &[]).unwrap();
        assert_eq!(subtopics, vec!["Preamble"]);

        let topics = distinct_values(&conn, ClassificationField::Topic, &[(ClassificationField::Board, "GSEB")]).unwrap();
        assert_eq!(topics, vec!["Rights"]);
    }

    #[test]
    fn get_records_by_ids_preserves_requested_order() {
        let conn = make_conn();
        let a = insert_record(&conn, &record("A", "t", "")).unwrap();
        let b = insert_record(&conn, &record("B", "t", "")).unwrap();
        let c = insert_record(&conn, &record("C", "t", "")).unwrap();

        let records = get_records_by_ids(&conn, &[c, a, 999, b]).unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c, a, b]);
    }

    #[test]
    fn matching_ids_treats_values_as_data() {
        let conn = make_conn();
        insert_record(&conn, &record("CBSE", "t", "")).unwrap();

        let ids = matching_ids(&conn, &[(ClassificationField::Board, "CBSE' OR '1'='1")]).unwrap();
        assert!(ids.is_empty());
    }
}
