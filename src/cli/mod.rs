pub mod chat;
pub mod embed_request;
pub mod models;

use anyhow::{Context, Result};
use nomic_client::chat::{ChatModel, Gpt4All};
use nomic_client::config::NomicConfig;
use nomic_client::download;

/// Download the chat executable, chat weights, and embedding tokenizer.
pub async fn model_download(config: &NomicConfig, force: bool) -> Result<()> {
    let home = config.resolved_home_dir();
    std::fs::create_dir_all(&home)
        .with_context(|| format!("failed to create home dir: {}", home.display()))?;

    let model = parse_chat_model(&config.chat.model)?;
    let gpt4all = Gpt4All::new(model, &home);
    gpt4all.ensure_artifacts(force).await?;

    let tokenizer_path = config.resolved_tokenizer_path();
    if tokenizer_path.exists() && !force {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        if download::download_file(download::TOKENIZER_URL, &tokenizer_path).await? {
            println!("Tokenizer saved to {}", tokenizer_path.display());
        }
    }

    if gpt4all.has_executable() && gpt4all.has_model() && tokenizer_path.exists() {
        println!("Model download complete. Ready for use.");
    } else {
        println!("Some downloads failed. Re-run `nomic model download` to retry.");
    }
    Ok(())
}

pub(crate) fn parse_chat_model(name: &str) -> Result<ChatModel> {
    name.parse::<ChatModel>().map_err(anyhow::Error::msg)
}
