//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::PathBuf, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default command trigger.
fn default_trigger() -> String {
    "!".to_string()
}

/// Default IRC user name.
fn default_bot_user() -> String {
    "chanbot".to_string()
}

/// Default Markov order (also the minimum message length fed to the brain).
fn default_markov_order() -> usize {
    4
}

/// Default maximum number of words in a generated reply.
fn default_markov_max_words() -> usize {
    30
}

/// Default interval between brain saves.
fn default_markov_save_interval_secs() -> u64 {
    10
}

/// Default number of queued brain exchanges.
fn default_markov_queue_capacity() -> usize {
    250
}

/// Default bounded wait for a brain reply.
fn default_markov_reply_timeout_secs() -> u64 {
    10
}

/// Default directory for channel logs.
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Default DuckDuckGo instant answer endpoint.
fn default_search_endpoint() -> String {
    "https://api.duckduckgo.com/".to_string()
}

/// Default Reddit endpoint used for cakeday lookups.
fn default_reddit_endpoint() -> String {
    "https://www.reddit.com".to_string()
}

/// Default package search endpoint.
fn default_packages_endpoint() -> String {
    "https://packages.sabayon.org/api/v1".to_string()
}

/// Default timeout for outbound HTTP requests.
fn default_http_timeout_secs() -> u64 {
    10
}

/// Configuration for the chanbot application.
///
/// Trivially cloneable; every clone shares the same read-only inner value.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

/// Informational links served by the `wiki`, `homepage`, `forum` and `bugs` commands.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LinkReferences {
    #[serde(default)]
    pub wiki: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub forum: String,
    #[serde(default)]
    pub bugs: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// IRC server address as `host:port` (`CHANBOT_SERVER`).
    pub server: String,
    /// Nick the bot registers with (`CHANBOT_BOT_NICK`).
    pub bot_nick: String,
    /// User name the bot registers with (`CHANBOT_BOT_USER`).
    #[serde(default = "default_bot_user")]
    pub bot_user: String,
    /// Prefix marking a message as a command (`CHANBOT_TRIGGER`).
    #[serde(default = "default_trigger")]
    pub trigger: String,
    /// Nicks allowed to shut the bot down.
    #[serde(default)]
    pub admins: Vec<String>,
    /// Channels joined after connecting.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Whether channel traffic feeds the Markov brain (`CHANBOT_MARKOV_ENABLED`).
    #[serde(default)]
    pub markov_enabled: bool,
    /// Markov chain order, and the minimum message length fed to the brain.
    #[serde(default = "default_markov_order")]
    pub markov_order: usize,
    /// Maximum number of words in a generated reply.
    #[serde(default = "default_markov_max_words")]
    pub markov_max_words: usize,
    /// File the brain is loaded from and saved to; the brain is memory-only when unset.
    #[serde(default)]
    pub markov_brain_file: Option<PathBuf>,
    /// Seconds between brain saves.
    #[serde(default = "default_markov_save_interval_secs")]
    pub markov_save_interval_secs: u64,
    /// Number of exchanges that may wait for the brain before new ones are dropped.
    #[serde(default = "default_markov_queue_capacity")]
    pub markov_queue_capacity: usize,
    /// Seconds to wait for a brain reply before giving up on it.
    #[serde(default = "default_markov_reply_timeout_secs")]
    pub markov_reply_timeout_secs: u64,
    /// Only speak generated replies when the bot's nick was mentioned.
    #[serde(default)]
    pub markov_reply_when_addressed: bool,
    /// Whether to greet every joiner.
    #[serde(default)]
    pub welcome_enabled: bool,
    /// The greeting sent to joiners.
    #[serde(default)]
    pub welcome_message: String,
    /// Whether to announce the bot when it joins a channel.
    #[serde(default)]
    pub message_on_join: bool,
    /// The announcement sent when the bot joins a channel.
    #[serde(default)]
    pub join_message: String,
    /// Root directory for per-channel logs (`CHANBOT_LOG_DIR`).
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Informational links.
    #[serde(default)]
    pub links: LinkReferences,
    /// DuckDuckGo instant answer endpoint.
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
    /// Reddit base URL for cakeday lookups.
    #[serde(default = "default_reddit_endpoint")]
    pub reddit_endpoint: String,
    /// Package search API base URL.
    #[serde(default = "default_packages_endpoint")]
    pub packages_endpoint: String,
    /// Timeout for outbound HTTP requests, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("CHANBOT").try_parsing(true));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the invariants the rest of the bot relies on.
    pub fn validate(&self) -> Res<()> {
        if self.server.trim().is_empty() {
            return Err(anyhow::anyhow!("A server address is required."));
        }

        if self.bot_nick.trim().is_empty() {
            return Err(anyhow::anyhow!("A bot nick is required."));
        }

        if self.trigger.is_empty() {
            return Err(anyhow::anyhow!("The command trigger must not be empty."));
        }

        if self.markov_order < 1 {
            return Err(anyhow::anyhow!("Markov order must be at least 1."));
        }

        if self.markov_queue_capacity < 1 {
            return Err(anyhow::anyhow!("Markov queue capacity must be at least 1."));
        }

        Ok(())
    }

    /// Whether `nick` exactly matches a configured admin.
    pub fn is_admin(&self, nick: &str) -> bool {
        self.admins.iter().any(|admin| admin == nick)
    }
}
