//! Core utilities, configuration, errors and logging

pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod text;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use locks::SessionLocks;
pub use logging::{init_logger, log_admin_configuration};
