//! Configuration loading.
//!
//! Values come from `~/.kotik/config.toml` when present, with environment
//! variables taking precedence (the deployment surface is env-first; the file
//! is for local development). Credentials are required and their absence is a
//! fatal startup error, so per-message handling never deals with missing
//! configuration.

mod defaults;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use kotik_types::{ApiKey, ProviderDescriptor};

pub use defaults::{
    DEFAULT_CACHE_LIFETIME_SECS, DEFAULT_HISTORY_WINDOW, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RING_CAPACITY, OPENROUTER_CHAT_COMPLETIONS_URL, PERSONA_PROMPT,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required credential {0}")]
    MissingCredential(&'static str),
    #[error("completion provider list cannot be empty")]
    EmptyProviderChain,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct KotikConfig {
    /// Telegram Bot API token.
    pub bot_token: ApiKey,
    pub sheets: SheetsConfig,
    pub completion: CompletionConfig,
    pub memory: MemoryConfig,
    /// Persona directive injected as the system turn of every request.
    pub persona_prompt: String,
    /// Short-command → canonical trigger phrase substitutions.
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub api_key: ApiKey,
    /// A1-notation range of the trigger and response columns.
    pub range: String,
    pub cache_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: ApiKey,
    /// Optional `HTTP-Referer` attribution URL.
    pub referer: Option<String>,
    pub request_timeout: Duration,
    /// Ordered fallback chain; tried first to last.
    pub providers: Vec<ProviderDescriptor>,
}

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Turns of history handed to completion providers.
    pub history_window: usize,
    /// Per-user ring capacity; must cover at least the window.
    pub ring_capacity: usize,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    bot_token: Option<String>,
    persona_prompt: Option<String>,
    aliases: Option<HashMap<String, String>>,
    #[serde(default)]
    sheets: SheetsFile,
    #[serde(default)]
    completion: CompletionFile,
    #[serde(default)]
    memory: MemoryFile,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsFile {
    spreadsheet_id: Option<String>,
    api_key: Option<String>,
    range: Option<String>,
    cache_lifetime_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionFile {
    api_key: Option<String>,
    referer: Option<String>,
    request_timeout_secs: Option<u64>,
    providers: Option<Vec<ProviderDescriptor>>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryFile {
    history_window: Option<usize>,
    ring_capacity: Option<usize>,
}

impl KotikConfig {
    /// `~/.kotik/config.toml`, when a home directory exists.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kotik").join("config.toml"))
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "loading config file");
                read_config_file(&path)?
            }
            _ => ConfigFile::default(),
        };
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Load from an explicit file path plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = read_config_file(path)?;
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bot_token = require(env("TELEGRAM_BOT_TOKEN"), file.bot_token, "TELEGRAM_BOT_TOKEN")?;
        let spreadsheet_id = require(
            env("GOOGLE_SHEETS_ID"),
            file.sheets.spreadsheet_id,
            "GOOGLE_SHEETS_ID",
        )?;
        let sheets_key = require(
            env("GOOGLE_SHEETS_API_KEY"),
            file.sheets.api_key,
            "GOOGLE_SHEETS_API_KEY",
        )?;
        let completion_key = require(
            env("OPENROUTER_API_KEY"),
            file.completion.api_key,
            "OPENROUTER_API_KEY",
        )?;

        let providers = file
            .completion
            .providers
            .unwrap_or_else(defaults::provider_chain);
        if providers.is_empty() {
            return Err(ConfigError::EmptyProviderChain);
        }

        Ok(Self {
            bot_token: ApiKey::new(bot_token),
            sheets: SheetsConfig {
                spreadsheet_id,
                api_key: ApiKey::new(sheets_key),
                range: file
                    .sheets
                    .range
                    .unwrap_or_else(|| defaults::SHEET_RANGE.to_string()),
                cache_lifetime: Duration::from_secs(
                    file.sheets
                        .cache_lifetime_secs
                        .unwrap_or(DEFAULT_CACHE_LIFETIME_SECS),
                ),
            },
            completion: CompletionConfig {
                api_key: ApiKey::new(completion_key),
                referer: env("KOTIK_REFERER").or(file.completion.referer),
                request_timeout: Duration::from_secs(
                    file.completion
                        .request_timeout_secs
                        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                ),
                providers,
            },
            memory: MemoryConfig {
                history_window: file.memory.history_window.unwrap_or(DEFAULT_HISTORY_WINDOW),
                ring_capacity: file.memory.ring_capacity.unwrap_or(DEFAULT_RING_CAPACITY),
            },
            persona_prompt: file
                .persona_prompt
                .unwrap_or_else(|| PERSONA_PROMPT.to_string()),
            aliases: file.aliases.unwrap_or_else(defaults::command_aliases),
        })
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn require(
    env_value: Option<String>,
    file_value: Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    env_value
        .or(file_value)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn full_env(name: &str) -> Option<String> {
        match name {
            "TELEGRAM_BOT_TOKEN" => Some("tg-token".to_string()),
            "GOOGLE_SHEETS_ID" => Some("sheet-id".to_string()),
            "GOOGLE_SHEETS_API_KEY" => Some("sheet-key".to_string()),
            "OPENROUTER_API_KEY" => Some("or-key".to_string()),
            _ => None,
        }
    }

    #[test]
    fn env_only_config_uses_defaults() {
        let config = KotikConfig::resolve(ConfigFile::default(), full_env).unwrap();

        assert_eq!(config.bot_token.expose_secret(), "tg-token");
        assert_eq!(config.sheets.range, "B:C");
        assert_eq!(config.sheets.cache_lifetime, Duration::from_secs(60));
        assert_eq!(config.completion.request_timeout, Duration::from_secs(30));
        assert_eq!(config.memory.history_window, 10);
        assert_eq!(config.memory.ring_capacity, 64);
        assert_eq!(config.completion.providers.len(), 2);
        assert_eq!(config.completion.providers[0].name, "gemini");
        assert_eq!(config.completion.providers[1].name, "deepseek");
        assert_eq!(config.aliases["/command1"], "мяу");
        assert!(config.persona_prompt.contains("Котик"));
    }

    #[test]
    fn missing_credential_is_fatal() {
        let partial = |name: &str| match name {
            "TELEGRAM_BOT_TOKEN" => Some("tg-token".to_string()),
            _ => None,
        };
        let err = KotikConfig::resolve(ConfigFile::default(), partial).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential("GOOGLE_SHEETS_ID")
        ));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let blank = |name: &str| match name {
            "TELEGRAM_BOT_TOKEN" => Some("   ".to_string()),
            other => full_env(other),
        };
        let err = KotikConfig::resolve(ConfigFile::default(), blank).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential("TELEGRAM_BOT_TOKEN")
        ));
    }

    #[test]
    fn file_values_fill_in_missing_env() {
        let file: ConfigFile = toml::from_str(
            r#"
            bot_token = "file-token"
            persona_prompt = "Ты — другой котик."

            [sheets]
            spreadsheet_id = "file-sheet"
            api_key = "file-sheet-key"
            range = "A:B"
            cache_lifetime_secs = 120

            [completion]
            api_key = "file-or-key"
            referer = "https://t.me/kotik_bot"
            request_timeout_secs = 10

            [[completion.providers]]
            name = "only"
            endpoint = "https://openrouter.ai/api/v1/chat/completions"
            model = "google/gemini-2.0-flash-exp:free"

            [memory]
            history_window = 4
            ring_capacity = 16
            "#,
        )
        .unwrap();

        let config = KotikConfig::resolve(file, no_env).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "file-token");
        assert_eq!(config.sheets.range, "A:B");
        assert_eq!(config.sheets.cache_lifetime, Duration::from_secs(120));
        assert_eq!(config.completion.request_timeout, Duration::from_secs(10));
        assert_eq!(config.completion.providers.len(), 1);
        assert_eq!(
            config.completion.referer.as_deref(),
            Some("https://t.me/kotik_bot")
        );
        assert_eq!(config.memory.history_window, 4);
        assert_eq!(config.persona_prompt, "Ты — другой котик.");
    }

    #[test]
    fn env_wins_over_file() {
        let file: ConfigFile = toml::from_str(r#"bot_token = "file-token""#).unwrap();
        let config = KotikConfig::resolve(file, full_env).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "tg-token");
    }

    #[test]
    fn empty_provider_list_is_rejected() {
        let file: ConfigFile = toml::from_str(
            r#"
            [completion]
            providers = []
            "#,
        )
        .unwrap();
        let err = KotikConfig::resolve(file, full_env).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyProviderChain));
    }

    #[test]
    fn load_from_reads_a_toml_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            bot_token = "tg-token"

            [sheets]
            spreadsheet_id = "sheet-id"
            api_key = "sheet-key"

            [completion]
            api_key = "or-key"
            "#
        )
        .unwrap();

        let config = KotikConfig::load_from(file.path()).unwrap();
        assert_eq!(config.sheets.spreadsheet_id, "sheet-id");
    }

    #[test]
    fn unparseable_file_is_a_parse_error() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not = [valid").unwrap();

        let err = KotikConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
