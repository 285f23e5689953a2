//! Local GPT4All chat over a subprocess.
//!
//! [`Gpt4All`] knows where the prebuilt chat executable and the quantized
//! weights live, fetches them on demand, and drives a [`ChatSession`] with a
//! strictly synchronous prompt/response exchange.

pub mod reader;
pub mod session;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

pub use session::ChatSession;

use crate::download;

const MODEL_BASE_URL: &str = "https://the-eye.eu/public/AI/models/nomic-ai/gpt4all";

/// Errors raised while talking to the chat process.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no chat process is running; call connect first")]
    NotConnected,

    #[error("chat process closed its output before finishing a response")]
    SessionEnded,

    #[error("failed to start chat executable {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chat process I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Quantized weight files the chat executable can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatModel {
    LoraQuantized,
    LoraUnfilteredQuantized,
}

impl ChatModel {
    pub const ALL: [ChatModel; 2] = [Self::LoraQuantized, Self::LoraUnfilteredQuantized];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoraQuantized => "gpt4all-lora-quantized",
            Self::LoraUnfilteredQuantized => "gpt4all-lora-unfiltered-quantized",
        }
    }

    /// Remote location of the weights file.
    pub fn url(&self) -> String {
        format!("{MODEL_BASE_URL}/{}.bin", self.as_str())
    }
}

impl std::fmt::Display for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChatModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown chat model: {s}. Supported: {}", known.join(", "))
            })
    }
}

/// Chat executable plus weights, with at most one live session.
pub struct Gpt4All {
    model: ChatModel,
    executable_path: PathBuf,
    model_path: PathBuf,
    executable_url: Option<String>,
    model_url: Option<String>,
    session: Option<ChatSession>,
}

impl Gpt4All {
    /// Describe the artifacts under `home_dir` without touching the network.
    pub fn new(model: ChatModel, home_dir: &Path) -> Self {
        Self {
            model,
            executable_path: home_dir.join("gpt4all"),
            model_path: home_dir.join(format!("{}.bin", model.as_str())),
            executable_url: None,
            model_url: None,
            session: None,
        }
    }

    /// Fetch artifacts from these URLs instead of the platform and model
    /// defaults.
    pub fn with_urls(
        mut self,
        executable_url: impl Into<String>,
        model_url: impl Into<String>,
    ) -> Self {
        self.executable_url = Some(executable_url.into());
        self.model_url = Some(model_url.into());
        self
    }

    pub fn model(&self) -> ChatModel {
        self.model
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Whether the executable is present.
    pub fn has_executable(&self) -> bool {
        self.executable_path.exists()
    }

    /// Whether a non-empty weights file is present.
    pub fn has_model(&self) -> bool {
        std::fs::metadata(&self.model_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    /// Download whichever artifacts are missing, or both when `force` is set.
    ///
    /// A failed download is reported and left for the next invocation; only
    /// an unsupported platform or a transport error is returned as an error.
    pub async fn ensure_artifacts(&self, force: bool) -> Result<()> {
        if force || !self.has_executable() {
            tracing::info!("downloading executable...");
            let url = match &self.executable_url {
                Some(url) => url.as_str(),
                None => download::executable_url(std::env::consts::OS, std::env::consts::ARCH)?,
            };
            if download::download_file(url, &self.executable_path).await? {
                mark_executable(&self.executable_path)?;
                println!("File downloaded successfully to {}", self.executable_path.display());
            }
        }

        if force || !self.has_model() {
            tracing::info!(model = %self.model, "downloading model...");
            let url = self.model_url.clone().unwrap_or_else(|| self.model.url());
            if download::download_file(&url, &self.model_path).await? {
                println!("File downloaded successfully to {}", self.model_path.display());
            }
        }

        Ok(())
    }

    /// Start a fresh session, closing any existing one first.
    pub fn connect(&mut self) -> Result<(), ChatError> {
        self.close();
        self.session = Some(ChatSession::open(&self.executable_path, &self.model_path)?);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(ChatSession::is_open)
    }

    /// Send a prompt and return the response text.
    ///
    /// If the exchange fails the session is torn down; call
    /// [`connect`](Self::connect) again before the next prompt.
    pub fn prompt(
        &mut self,
        text: &str,
        echo: Option<&mut dyn Write>,
    ) -> Result<String, ChatError> {
        let session = self.session.as_mut().ok_or(ChatError::NotConnected)?;
        let result = session.prompt(text, echo);
        if result.is_err() {
            tracing::warn!("chat session broken, closing");
            self.close();
        }
        result
    }

    /// Kill the running process, if any.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            tracing::debug!("ending session...");
            session.close();
        }
    }
}

impl Drop for Gpt4All {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
