//! Bot instance creation and the command list

use reqwest::ClientBuilder;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ParseMode};
use teloxide::utils::command::BotCommands;

use pyqcore::Config;

use super::Bot;

/// Timeout for every Bot API request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the filter menu")]
    Start,
    #[command(description = "admin panel (admins only)")]
    Admin,
    #[command(description = "add a new question (admins only)")]
    Addquestion,
}

impl Command {
    /// Action token the core router understands for this command
    pub fn token(&self) -> &'static str {
        match self {
            Command::Start => "menu",
            Command::Admin => "admin",
            Command::Addquestion => "addq",
        }
    }
}

/// Creates a Bot instance with a custom API URL when `BOT_API_URL` is set
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    if config.bot_token.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }

    let client = ClientBuilder::new().timeout(REQUEST_TIMEOUT).build()?;
    let mut bot = teloxide::Bot::with_client(&config.bot_token, client);

    if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot = bot.set_api_url(url);
    }

    Ok(bot.parse_mode(ParseMode::Html))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "show the filter menu"),
        BotCommand::new("admin", "admin panel (admins only)"),
        BotCommand::new("addquestion", "add a new question (admins only)"),
    ])
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commands_parse() {
        assert_eq!(Command::parse("/start", "pyqbot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/addquestion", "pyqbot").unwrap(), Command::Addquestion);
        assert!(Command::parse("/unknown", "pyqbot").is_err());
    }

    #[test]
    fn test_command_tokens() {
        assert_eq!(Command::Start.token(), "menu");
        assert_eq!(Command::Admin.token(), "admin");
        assert_eq!(Command::Addquestion.token(), "addq");
    }

    #[test]
    fn test_create_bot_requires_token() {
        assert!(create_bot(&Config::default()).is_err());
    }
}
