//! pyq core - previous-year-question quiz engine
//!
//! Everything the Telegram bot needs that does not talk to Telegram:
//! storage, filter sessions, cascading enumeration, quiz sampling and the
//! add-question wizard. The bot crate turns Telegram updates into
//! [`quiz::InboundEvent`]s and renders the returned [`quiz::Reply`] values.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, per-user locks
//! - `storage`: SQLite pool, migrations, records and sessions
//! - `quiz`: filters, enumeration, sampler, wizard and the event router

pub mod core;
pub mod quiz;
pub mod storage;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, Config};
pub use quiz::{InboundEvent, QuizService, Reply};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
