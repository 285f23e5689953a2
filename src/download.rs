//! Artifact downloads: chat executable, model weights, tokenizer files.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

const EXECUTABLE_MAC_ARM64_URL: &str = "https://static.nomic.ai/gpt4all/gpt4all-pywrap-mac-arm64";
const EXECUTABLE_LINUX_X86_64_URL: &str =
    "https://static.nomic.ai/gpt4all/gpt4all-pywrap-linux-x86_64";

/// Tokenizer used by nomic-embed-text-v1.5.
pub const TOKENIZER_URL: &str =
    "https://huggingface.co/bert-base-uncased/resolve/main/tokenizer.json";

/// Pick the prebuilt chat executable for a platform, using the names from
/// [`std::env::consts::OS`] and [`std::env::consts::ARCH`].
pub fn executable_url(os: &str, arch: &str) -> Result<&'static str> {
    match (os, arch) {
        ("macos", "aarch64") => Ok(EXECUTABLE_MAC_ARM64_URL),
        ("linux", "x86_64") => Ok(EXECUTABLE_LINUX_X86_64_URL),
        _ => bail!(
            "Your platform is not supported: {os}/{arch}. \
             Current binaries supported are x86 Linux and ARM Macs."
        ),
    }
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
///
/// Returns `Ok(false)` without touching `dest` when the server answers with a
/// non-success status.
pub async fn download_file(url: &str, dest: &Path) -> Result<bool> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, %status, "download failed");
        println!("Failed to download the file. Status code: {}", status.as_u16());
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    tracing::info!(%url, dest = %dest.display(), "download complete");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_platforms_resolve() {
        assert_eq!(
            executable_url("macos", "aarch64").unwrap(),
            EXECUTABLE_MAC_ARM64_URL
        );
        assert_eq!(
            executable_url("linux", "x86_64").unwrap(),
            EXECUTABLE_LINUX_X86_64_URL
        );
    }

    #[test]
    fn unsupported_platform_is_named() {
        let err = executable_url("windows", "x86_64").unwrap_err().to_string();
        assert!(err.contains("windows/x86_64"), "{err}");
        let err = executable_url("macos", "x86_64").unwrap_err().to_string();
        assert!(err.contains("macos/x86_64"), "{err}");
    }

    #[tokio::test]
    #[ignore] // Requires network — run with: cargo test -- --ignored
    async fn downloads_tokenizer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("nested").join("tokenizer.json");
        assert!(download_file(TOKENIZER_URL, &dest).await.unwrap());
        assert!(std::fs::metadata(&dest).unwrap().len() > 0);
    }
}
