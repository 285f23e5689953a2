use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NomicConfig {
    pub logging: LoggingConfig,
    pub chat: ChatConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Directory holding the chat executable and model weights.
    pub home_dir: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub tokenizer_path: String,
    pub batch_size: usize,
}

impl Default for NomicConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            chat: ChatConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            home_dir: default_nomic_dir().to_string_lossy().into_owned(),
            model: "gpt4all-lora-quantized".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let tokenizer_path = default_nomic_dir()
            .join("tokenizers")
            .join("bert-base-uncased.json")
            .to_string_lossy()
            .into_owned();
        Self {
            model: "nomic-embed-text-v1.5".into(),
            tokenizer_path,
            batch_size: crate::embedding::request::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Returns `~/.nomic/`
pub fn default_nomic_dir() -> PathBuf {
    home_dir().join(".nomic")
}

/// Returns the default config file path: `~/.nomic/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nomic_dir().join("config.toml")
}

impl NomicConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NomicConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (NOMIC_HOME, NOMIC_LOG_LEVEL, NOMIC_TOKENIZER, NOMIC_CHAT_MODEL).
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup, keyed by the env var names.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("NOMIC_HOME") {
            self.chat.home_dir = val;
        }
        if let Some(val) = lookup("NOMIC_LOG_LEVEL") {
            self.logging.log_level = val;
        }
        if let Some(val) = lookup("NOMIC_TOKENIZER") {
            self.embedding.tokenizer_path = val;
        }
        if let Some(val) = lookup("NOMIC_CHAT_MODEL") {
            self.chat.model = val;
        }
    }

    /// Resolve the chat home directory, expanding `~` if needed.
    pub fn resolved_home_dir(&self) -> PathBuf {
        expand_tilde(&self.chat.home_dir)
    }

    /// Resolve the tokenizer file path, expanding `~` if needed.
    pub fn resolved_tokenizer_path(&self) -> PathBuf {
        expand_tilde(&self.embedding.tokenizer_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}
