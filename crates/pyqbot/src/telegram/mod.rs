//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod render;

/// Bot handle used everywhere; every text is sent with HTML parse mode
pub type Bot = teloxide::adaptors::DefaultParseMode<teloxide::Bot>;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands};
pub use handlers::{schema, HandlerDeps};
