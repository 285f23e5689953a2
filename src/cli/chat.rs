//! CLI `chat` command — interactive prompt loop against the local model.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use nomic_client::chat::{ChatError, Gpt4All};
use nomic_client::config::NomicConfig;

/// Download missing artifacts, start the model, and relay stdin lines as prompts.
pub async fn chat(
    config: &NomicConfig,
    model: Option<&str>,
    force_download: bool,
    echo: bool,
) -> Result<()> {
    let model = super::parse_chat_model(model.unwrap_or(&config.chat.model))?;
    let gpt4all = Gpt4All::new(model, &config.resolved_home_dir());
    gpt4all.ensure_artifacts(force_download).await?;

    anyhow::ensure!(
        gpt4all.has_executable() && gpt4all.has_model(),
        "chat artifacts missing under {}. Run `nomic model download` first.",
        config.resolved_home_dir().display()
    );

    tokio::task::spawn_blocking(move || run_loop(gpt4all, echo))
        .await
        .context("chat loop panicked")?
}

fn run_loop(mut gpt4all: Gpt4All, echo: bool) -> Result<()> {
    println!("Loading {}...", gpt4all.model());
    gpt4all.connect()?;
    println!("Ready. Type a prompt, or /quit to exit.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next() else { break };
        let line = line.context("failed to read prompt")?;
        if line.trim() == "/quit" {
            break;
        }

        let result = if echo {
            gpt4all.prompt(&line, Some(&mut stdout))
        } else {
            gpt4all.prompt(&line, None)
        };

        match result {
            Ok(response) => {
                if !echo {
                    print!("{response}");
                }
                println!();
            }
            Err(e @ (ChatError::SessionEnded | ChatError::Io(_))) => {
                tracing::error!(error = %e, "chat session lost, reconnecting");
                gpt4all.connect()?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    gpt4all.close();
    Ok(())
}
