//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Admin / storage / delivery configuration summary at startup

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

use crate::core::config::Config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file (appended to, created if missing)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to open the file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, simplelog::Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// Secrets (the bot token) are never printed, only whether one is present.
pub fn log_admin_configuration(config: &Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config.bot_token.is_empty() {
        log::error!("❌ BOT_TOKEN / TELOXIDE_TOKEN: not set");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    if config.admins.is_empty() {
        log::warn!("⚠️  ADMIN_IDS: not set, nobody can add questions");
    } else {
        log::info!("✅ ADMIN_IDS: {} admin(s)", config.admins.len());
    }

    log::info!("🗄️  DATABASE_PATH: {}", config.database_path);
    log::info!("🎯 QUIZ_SIZE: {}", config.quiz_size);

    match &config.webhook_url {
        Some(url) => log::info!("🌐 Delivery: webhook {} (port {})", url, config.port),
        None => log::info!("📡 Delivery: long polling"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
