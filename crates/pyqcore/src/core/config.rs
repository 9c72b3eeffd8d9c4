//! Runtime configuration
//!
//! Values are read once from the environment in `main` and the resulting
//! [`Config`] is passed down explicitly. Nothing here is a global.

use std::collections::BTreeSet;
use std::env;

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "questions.db";

/// Default log file
pub const DEFAULT_LOG_FILE_PATH: &str = "pyq.log";

/// Default HTTP port for webhook mode
pub const DEFAULT_PORT: u16 = 8080;

/// Path the webhook listener is mounted on
pub const WEBHOOK_PATH: &str = "/webhook";

/// Quiz sampling configuration
pub mod quiz {
    /// Number of polls sent per generated quiz
    pub const DEFAULT_SIZE: u32 = 10;

    /// Upper bound for `QUIZ_SIZE`, keeps one click from flooding a chat
    pub const MAX_SIZE: u32 = 50;

    /// Clamp a configured quiz size into `1..=MAX_SIZE`
    pub fn clamp_size(size: u32) -> u32 {
        size.clamp(1, MAX_SIZE)
    }
}

/// Admin configuration
pub mod admin {
    use super::BTreeSet;

    /// Static allow-list of privileged Telegram user ids.
    ///
    /// Consulted only when a user opens the admin panel or starts the
    /// add-question wizard.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct AdminList {
        ids: BTreeSet<i64>,
    }

    impl AdminList {
        pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
            Self {
                ids: ids.into_iter().collect(),
            }
        }

        /// Parse a comma/whitespace separated id list (the `ADMIN_IDS` format)
        pub fn parse(raw: &str) -> Self {
            let ids = raw
                .split([',', ' ', '\n', '\t'])
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .filter_map(|part| match part.parse::<i64>() {
                    Ok(id) => Some(id),
                    Err(_) => {
                        log::warn!("Ignoring invalid ADMIN_IDS entry: {:?}", part);
                        None
                    }
                })
                .collect();
            Self { ids }
        }

        pub fn contains(&self, user_id: i64) -> bool {
            self.ids.contains(&user_id)
        }

        pub fn len(&self) -> usize {
            self.ids.len()
        }

        pub fn is_empty(&self) -> bool {
            self.ids.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
            self.ids.iter().copied()
        }
    }
}

use admin::AdminList;

/// Bot configuration assembled at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Read from BOT_TOKEN or TELOXIDE_TOKEN
    pub bot_token: String,
    /// Read from DATABASE_PATH
    pub database_path: String,
    /// Read from LOG_FILE_PATH
    pub log_file_path: String,
    /// Read from ADMIN_IDS
    pub admins: AdminList,
    /// Read from WEBHOOK_URL; polling is used when absent
    pub webhook_url: Option<String>,
    /// Read from PORT
    pub port: u16,
    /// Read from QUIZ_SIZE
    pub quiz_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            log_file_path: DEFAULT_LOG_FILE_PATH.to_string(),
            admins: AdminList::default(),
            webhook_url: None,
            port: DEFAULT_PORT,
            quiz_size: quiz::DEFAULT_SIZE,
        }
    }
}

impl Config {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT").map(|raw| raw.trim().parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                log::warn!("Invalid PORT value ({}), using {}", e, DEFAULT_PORT);
                DEFAULT_PORT
            }
            None => DEFAULT_PORT,
        };

        let quiz_size = get("QUIZ_SIZE")
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .map(quiz::clamp_size)
            .unwrap_or(quiz::DEFAULT_SIZE);

        Self {
            bot_token: get("BOT_TOKEN").or_else(|| get("TELOXIDE_TOKEN")).unwrap_or_default(),
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_file_path: get("LOG_FILE_PATH").unwrap_or(defaults.log_file_path),
            admins: get("ADMIN_IDS").map(|raw| AdminList::parse(&raw)).unwrap_or_default(),
            webhook_url: get("WEBHOOK_URL"),
            port,
            quiz_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.quiz_size, quiz::DEFAULT_SIZE);
        assert!(config.admins.is_empty());
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_admin_ids_parse_mixed_separators() {
        let admins = AdminList::parse("8226659957, 42\n7\tnot-a-number");
        assert_eq!(admins.len(), 3);
        assert!(admins.contains(8226659957));
        assert!(admins.contains(42));
        assert!(admins.contains(7));
        assert!(!admins.contains(0));
    }

    #[test]
    fn test_teloxide_token_fallback_and_quiz_size_clamp() {
        let config = Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", "abc"), ("QUIZ_SIZE", "500"), ("PORT", "x")]));
        assert_eq!(config.bot_token, "abc");
        assert_eq!(config.quiz_size, quiz::MAX_SIZE);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        let config = Config::from_lookup(lookup(&[("WEBHOOK_URL", "  ")]));
        assert!(config.webhook_url.is_none());
    }
}
