//! Update handlers

pub mod schema;
pub mod types;

pub use schema::schema;
pub use types::HandlerDeps;
