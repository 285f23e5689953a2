//! Text embedding request preparation.
//!
//! Holds the [`ModelRegistry`] of serving facts per model, tokenizer loading,
//! and [`tokenize_text`], which never returns an empty token sequence. Request
//! body construction lives in [`request`].

pub mod request;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tokenizers::Tokenizer;

/// Substitute for a missing text: hex md5 of `"nomic null"`.
pub const NULL_PLACEHOLDER: &str = "2f865186b9e9d2d6e0aec1690159e139";

/// Substitute for a blank text: hex md5 of `"nomic empty"`.
pub const EMPTY_PLACEHOLDER: &str = "24df574ea1c998de59d5be15e769658e";

/// Embedding models the serving endpoint hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEmbeddingModel {
    NomicEmbedTextV1_5,
}

impl TextEmbeddingModel {
    pub const ALL: [TextEmbeddingModel; 1] = [Self::NomicEmbedTextV1_5];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NomicEmbedTextV1_5 => "nomic-embed-text-v1.5",
        }
    }

    /// Whether binary (hamming) embeddings are meaningful for this model.
    pub fn hamming_capable(&self) -> bool {
        matches!(self, Self::NomicEmbedTextV1_5)
    }

    /// Whether embeddings can be truncated to a prefix of their dimensions.
    pub fn matryoshka_capable(&self) -> bool {
        matches!(self, Self::NomicEmbedTextV1_5)
    }
}

impl std::fmt::Display for TextEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextEmbeddingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown embedding model: {s}. Supported: {}", known.join(", "))
            })
    }
}

/// Serving facts for one embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Full output dimensionality.
    pub dim: usize,
    /// Longest token sequence the endpoint accepts.
    pub max_length: usize,
    /// Token id used to pad shorter sequences in a batch.
    pub pad_id: u32,
    /// Dimensions worth truncating to; empty means only `dim`.
    pub recommended_dims: Vec<usize>,
}

impl ModelInfo {
    pub fn recommended_dims(&self) -> Vec<usize> {
        if self.recommended_dims.is_empty() {
            vec![self.dim]
        } else {
            self.recommended_dims.clone()
        }
    }
}

/// Lookup table from model to [`ModelInfo`], passed explicitly to whatever
/// needs it.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: HashMap<TextEmbeddingModel, ModelInfo>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut models = HashMap::new();
        models.insert(
            TextEmbeddingModel::NomicEmbedTextV1_5,
            ModelInfo {
                dim: 768,
                max_length: 2048,
                pad_id: 0,
                recommended_dims: vec![768, 512, 384, 256, 128],
            },
        );
        Self { models }
    }
}

impl ModelRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Add or replace the entry for `model`.
    pub fn insert(&mut self, model: TextEmbeddingModel, info: ModelInfo) {
        self.models.insert(model, info);
    }

    pub fn get(&self, model: TextEmbeddingModel) -> Result<&ModelInfo> {
        self.models
            .get(&model)
            .with_context(|| format!("no model info registered for {model}"))
    }
}

/// Replace a missing or blank text with a fixed placeholder.
pub fn null_empty_placeholder(text: Option<&str>) -> &str {
    match text {
        None => NULL_PLACEHOLDER,
        Some(t) if t.trim().is_empty() => EMPTY_PLACEHOLDER,
        Some(t) => t,
    }
}

/// Load a `tokenizer.json` and truncate to the model's `max_length`.
///
/// Any padding configured in the file is switched off; batches are padded
/// when the request is built so pad tokens stay out of the attention mask.
pub fn load_tokenizer(
    path: &Path,
    model: TextEmbeddingModel,
    registry: &ModelRegistry,
) -> Result<Tokenizer> {
    let info = registry.get(model)?;
    anyhow::ensure!(
        path.exists(),
        "Tokenizer not found at {}. Run `nomic model download` first.",
        path.display()
    );

    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: info.max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
    tokenizer.with_padding(None);

    tracing::info!(tokenizer = %path.display(), %model, "tokenizer loaded");
    Ok(tokenizer)
}

/// Tokenize without special tokens, substituting [`EMPTY_PLACEHOLDER`] once
/// if the text produces no tokens.
pub fn tokenize_text(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let ids = encode(tokenizer, text)?;
    if !ids.is_empty() {
        return Ok(ids);
    }

    tracing::warn!("zero tokens generated from text");
    let ids = encode(tokenizer, EMPTY_PLACEHOLDER)?;
    anyhow::ensure!(!ids.is_empty(), "placeholder text also produced zero tokens");
    Ok(ids)
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}
