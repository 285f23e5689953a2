#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nomic_client::embedding::{self, ModelRegistry, TextEmbeddingModel};
use tempfile::TempDir;
use tokenizers::Tokenizer;

/// Word-level tokenizer: lowercases, splits on whitespace, unknown words map to id 1.
const TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": { "type": "Lowercase" },
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": {
      "[PAD]": 0,
      "[UNK]": 1,
      "hello": 2,
      "a": 3,
      "longer": 4,
      "sentence": 5,
      "world": 6
    },
    "unk_token": "[UNK]"
  }
}"#;

pub const UNK_ID: u32 = 1;

/// Padding block as a HuggingFace export would ship it.
const PADDING_JSON: &str = r#"{
    "strategy": "BatchLongest",
    "direction": "Right",
    "pad_to_multiple_of": 4,
    "pad_id": 0,
    "pad_type_id": 0,
    "pad_token": "[PAD]"
  }"#;

/// Write the fixture tokenizer into `dir` and return its path.
pub fn write_tokenizer(dir: &Path) -> PathBuf {
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, TOKENIZER_JSON).unwrap();
    path
}

/// Like [`write_tokenizer`], but the file has padding switched on.
pub fn write_padded_tokenizer(dir: &Path) -> PathBuf {
    let path = dir.join("tokenizer-padded.json");
    let json = TOKENIZER_JSON.replace(
        r#""padding": null"#,
        &format!(r#""padding": {PADDING_JSON}"#),
    );
    std::fs::write(&path, json).unwrap();
    path
}

/// Load the fixture tokenizer through the crate's loader.
pub fn test_tokenizer(registry: &ModelRegistry) -> (TempDir, Tokenizer) {
    let tmp = TempDir::new().unwrap();
    let path = write_tokenizer(tmp.path());
    let tokenizer =
        embedding::load_tokenizer(&path, TextEmbeddingModel::NomicEmbedTextV1_5, registry)
            .unwrap();
    (tmp, tokenizer)
}

/// Install a shell script as `<home>/gpt4all` and a non-empty weights file,
/// so no download is needed.
#[cfg(unix)]
pub fn install_fake_chat(home: &Path, weights_name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let exe = home.join("gpt4all");
    std::fs::write(&exe, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(home.join(weights_name), b"fake weights").unwrap();
    exe
}

/// Local HTTP server answering every request with `404 Not Found`.
///
/// Returns the base URL and a counter of requests served. Must be called
/// inside a tokio runtime.
pub async fn not_found_server() -> (String, Arc<AtomicUsize>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    )
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), hits)
}
