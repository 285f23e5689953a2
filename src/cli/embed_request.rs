//! CLI `embed-request` command — write Triton request bodies for a file of texts.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use nomic_client::config::NomicConfig;
use nomic_client::embedding::{
    self, null_empty_placeholder, request, ModelRegistry, TextEmbeddingModel,
};

/// Tokenize every text in `input` and write one request body per batch into `out`.
pub fn embed_request(
    config: &NomicConfig,
    input: &Path,
    out: &Path,
    batch_size: Option<usize>,
) -> Result<()> {
    let batch_size = batch_size.unwrap_or(config.embedding.batch_size);
    anyhow::ensure!(batch_size > 0, "batch size must be at least 1");

    let model: TextEmbeddingModel = config
        .embedding
        .model
        .parse()
        .map_err(anyhow::Error::msg)?;
    let registry = ModelRegistry::default();
    let pad_id = registry.get(model)?.pad_id;
    let tokenizer =
        embedding::load_tokenizer(&config.resolved_tokenizer_path(), model, &registry)?;

    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let texts = parse_texts(&contents)?;
    if texts.is_empty() {
        println!("No texts found in {}.", input.display());
        return Ok(());
    }

    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create output dir: {}", out.display()))?;

    let batches = texts.len().div_ceil(batch_size);
    println!(
        "Building {batches} request(s) for {} texts with model '{model}'...",
        texts.len()
    );

    let pb = ProgressBar::new(batches as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    for (i, req) in request::batch_requests(&texts, &tokenizer, pad_id, batch_size)?.enumerate() {
        let req = req.with_context(|| format!("failed to build request {i}"))?;
        let path = out.join(format!("request-{i:04}.bin"));
        let (shape, json_header_size, content_type) =
            (req.shape(), req.json_header_size(), req.content_type());
        std::fs::write(&path, req.into_body())
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            ?shape,
            json_header_size,
            "request written"
        );
        pb.println(format!("{}\t{content_type}", path.display()));
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!("Wrote {batches} request(s) to {}.", out.display());
    Ok(())
}

/// Accept a JSON array of strings or nulls, or plain text with one entry per line.
fn parse_texts(contents: &str) -> Result<Vec<String>> {
    if contents.trim_start().starts_with('[') {
        let entries: Vec<Option<String>> =
            serde_json::from_str(contents).context("failed to parse JSON text array")?;
        Ok(entries
            .iter()
            .map(|t| null_empty_placeholder(t.as_deref()).to_owned())
            .collect())
    } else {
        Ok(contents
            .lines()
            .map(|l| null_empty_placeholder(Some(l)).to_owned())
            .collect())
    }
}
