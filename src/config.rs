//! # Configuration Module
//!
//! Runtime settings read from the environment. The binary loads a `.env`
//! file from the working directory before reading them.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::dialogue::UserId;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parse the `LOG_FORMAT` setting; unset or empty means pretty output
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("pretty") => Ok(LogFormat::Pretty),
            Some("json") => Ok(LogFormat::Json),
            Some(other) => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{other}'"),
        }
    }
}

/// Users allowed to talk to the bot.
///
/// An empty list authorizes nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedUsers {
    users: HashSet<UserId>,
    invalid_entries: Vec<String>,
}

impl AuthorizedUsers {
    /// Authorize exactly `users`
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: users.into_iter().collect(),
            invalid_entries: Vec::new(),
        }
    }

    /// Parse a comma-separated list of user ids.
    ///
    /// Unparsable entries authorize no one; they are kept so startup can report them.
    pub fn parse(list: &str) -> Self {
        let mut users = HashSet::new();
        let mut invalid_entries = Vec::new();

        for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            match entry.parse::<UserId>() {
                Ok(user_id) => {
                    users.insert(user_id);
                }
                Err(_) => invalid_entries.push(entry.to_string()),
            }
        }

        Self {
            users,
            invalid_entries,
        }
    }

    pub fn is_authorized(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }

    /// Entries of the configured list that are not user ids
    pub fn invalid_entries(&self) -> &[String] {
        &self.invalid_entries
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub telegram_bot_token: String,
    /// PostgreSQL connection string; tags are kept in memory without it
    pub database_url: Option<String>,
    /// Users allowed to use the bot
    pub authorized_users: AuthorizedUsers,
    /// Log output format
    pub log_format: LogFormat,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let authorized_users = lookup("AUTHORIZED_USERS")
            .map(|list| AuthorizedUsers::parse(&list))
            .unwrap_or_default();

        let log_format = LogFormat::parse(lookup("LOG_FORMAT").as_deref())?;

        Ok(Self {
            telegram_bot_token,
            database_url,
            authorized_users,
            log_format,
        })
    }
}
