use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tokio::time::{interval, sleep};

use pyqcore::core::config::{self, Config};
use pyqcore::core::{init_logger, log_admin_configuration};
use pyqcore::storage::records::count_records;
use pyqcore::storage::{create_pool, get_connection, DbPool, SessionStore, SqliteSessionStore};
use pyqcore::QuizService;

mod cli;
mod telegram;

use cli::{Cli, Commands};
use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Dispatcher restarts allowed after a panic before giving up
const MAX_DISPATCHER_RETRIES: u32 = 5;

/// How often idle per-user locks are dropped
const LOCK_PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file) before anything else logs
    let log_file_path = std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| config::DEFAULT_LOG_FILE_PATH.to_string());
    init_logger(&log_file_path)?;

    let config = Config::from_env();

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(config, webhook).await
        }
        Some(Commands::Migrate) => run_migrate(&config),
        Some(Commands::Stats) => run_stats(&config),
        None => {
            // No command specified - default to running the bot
            log::info!("No command specified, running bot in default mode");
            run_bot(config, false).await
        }
    }
}

fn open_pool(config: &Config) -> Result<Arc<DbPool>> {
    let pool = create_pool(&config.database_path)
        .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    Ok(Arc::new(pool))
}

/// Applies migrations (done by the pool) and exits
fn run_migrate(config: &Config) -> Result<()> {
    open_pool(config)?;
    log::info!("Database at {} is up to date", config.database_path);
    Ok(())
}

/// Prints the number of stored questions
fn run_stats(config: &Config) -> Result<()> {
    let pool = open_pool(config)?;
    let conn = get_connection(&pool)?;
    let count = count_records(&conn)?;
    println!("Questions stored: {}", count);
    Ok(())
}

/// Run the bot in polling or webhook mode
async fn run_bot(config: Config, use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");
    log_admin_configuration(&config);

    let pool = open_pool(&config)?;
    let sessions: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(Arc::clone(&pool)));
    let service = Arc::new(QuizService::new(pool, sessions, &config));

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    // Drop lock entries of users who went quiet
    let prune_service = Arc::clone(&service);
    tokio::spawn(async move {
        let mut ticker = interval(LOCK_PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            prune_service.locks().prune_idle();
            log::debug!("Session locks after pruning: {}", prune_service.locks().len());
        }
    });

    let handler = schema(HandlerDeps::new(service));

    let webhook_url = if use_webhook { config.webhook_url.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        return Err(anyhow::anyhow!("--webhook requires WEBHOOK_URL to be set"));
    }

    if let Some(base) = webhook_url {
        let url = webhook_endpoint(&base)?;
        let address = SocketAddr::from(([0, 0, 0, 0], config.port));
        log::info!("Starting bot in webhook mode at {} (listening on {})", url, address);

        let listener = webhooks::axum(bot.clone(), webhooks::Options::new(address, url)).await?;
        log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
            )
            .await;
        return Ok(());
    }

    log::info!("Starting bot in long polling mode");
    log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

    // Run the dispatcher with retry logic
    let mut retry_count = 0;
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Dispatcher runs in its own task so a panic surfaces through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= MAX_DISPATCHER_RETRIES {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher after panic (attempt {}/{})...",
                    retry_count,
                    MAX_DISPATCHER_RETRIES
                );
                exponential_backoff(retry_count).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }
    }

    Ok(())
}

/// Full webhook URL: `WEBHOOK_URL` with the webhook path appended unless present
fn webhook_endpoint(base: &str) -> Result<url::Url> {
    let trimmed = base.trim_end_matches('/');
    let full = if trimmed.ends_with(config::WEBHOOK_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, config::WEBHOOK_PATH)
    };
    url::Url::parse(&full).map_err(|e| anyhow::anyhow!("Invalid WEBHOOK_URL {:?}: {}", base, e))
}

/// 2, 4, 8 ... seconds, capped at one minute
async fn exponential_backoff(attempt: u32) {
    let delay = Duration::from_secs(2u64.saturating_pow(attempt).min(60));
    log::info!("Waiting {:?} before retry", delay);
    sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_webhook_endpoint_appends_path_once() {
        assert_eq!(
            webhook_endpoint("https://example.com").unwrap().as_str(),
            "https://example.com/webhook"
        );
        assert_eq!(
            webhook_endpoint("https://example.com/webhook/").unwrap().as_str(),
            "https://example.com/webhook"
        );
        assert!(webhook_endpoint("not a url").is_err());
    }
}
