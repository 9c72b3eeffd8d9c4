//! Shared fixtures for the quiz integration tests

#![allow(dead_code)]

use std::sync::Arc;

use pyqcore::core::config::admin::AdminList;
use pyqcore::quiz::events::{Presentation, Reply, TextReply};
use pyqcore::quiz::model::{Classification, NewRecord};
use pyqcore::storage::records::insert_record;
use pyqcore::storage::{create_memory_pool, get_connection, DbPool, SqliteSessionStore};
use pyqcore::QuizService;

pub const ADMIN: i64 = 1001;
pub const STUDENT: i64 = 2002;

pub struct Fixture {
    pub pool: Arc<DbPool>,
    pub sessions: Arc<SqliteSessionStore>,
    pub service: QuizService,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_quiz_size(10)
    }

    pub fn with_quiz_size(quiz_size: u32) -> Self {
        let pool = Arc::new(create_memory_pool().expect("memory pool"));
        let sessions = Arc::new(SqliteSessionStore::new(Arc::clone(&pool)));
        let service = QuizService::with_admins(
            Arc::clone(&pool),
            sessions.clone(),
            AdminList::new([ADMIN]),
            quiz_size,
        );
        Self {
            pool,
            sessions,
            service,
        }
    }

    pub fn insert(&self, record: &NewRecord) -> i64 {
        let conn = get_connection(&self.pool).expect("connection");
        insert_record(&conn, record).expect("insert record")
    }

    /// Seeds a small catalogue spanning two boards
    pub fn seed_catalogue(&self) {
        for (board, year, subject, topic) in [
            ("CBSE", "2023", "Polity", "Constitution"),
            ("CBSE", "2023", "Polity", "Parliament"),
            ("CBSE", "2022", "Science", "Optics"),
            ("CBSE", "2022", "Science", ""),
            ("GSEB", "2021", "Geography", "Rivers"),
            ("GSEB", "2023", "Polity", "Constitution"),
        ] {
            self.insert(&record(board, year, subject, topic));
        }
    }
}

pub fn record(board: &str, year: &str, subject: &str, topic: &str) -> NewRecord {
    NewRecord {
        classification: Classification {
            board: Some(board.to_string()),
            year: Some(year.to_string()),
            exam: Some("Talati".to_string()),
            subject: Some(subject.to_string()),
            topic: Some(topic.to_string()),
            subtopic: None,
        },
        question_text: format!("{board} {year} {subject} {topic}?"),
        options: ["A", "B", "C", "D"].map(String::from),
        correct_option: 1,
        explanation: Some("Because.".to_string()),
    }
}

pub fn texts(replies: &[Reply]) -> Vec<&TextReply> {
    replies
        .iter()
        .filter_map(|reply| match reply {
            Reply::Text(text) => Some(text),
            Reply::Poll(_) => None,
        })
        .collect()
}

pub fn only_text(replies: &[Reply]) -> &TextReply {
    match replies {
        [Reply::Text(text)] => text,
        other => panic!("expected exactly one text reply, got {other:?}"),
    }
}

/// Labels of the value buttons of a selection keyboard, without the back row
pub fn value_labels(reply: &TextReply) -> Vec<String> {
    let rows = reply.options.as_ref().expect("keyboard");
    rows.iter()
        .flatten()
        .filter(|option| option.token != "back_to_main")
        .map(|option| option.label.clone())
        .collect()
}

pub fn is_alert(reply: &TextReply) -> bool {
    reply.presentation == Presentation::Alert
}
