mod helpers;

use std::sync::atomic::Ordering;

use helpers::not_found_server;
use nomic_client::chat::{ChatModel, Gpt4All};
use nomic_client::download::download_file;
use tempfile::TempDir;

#[tokio::test]
async fn not_found_leaves_no_file_behind() {
    let (base, hits) = not_found_server().await;
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("nested").join("tokenizer.json");

    let downloaded = download_file(&format!("{base}/tokenizer.json"), &dest)
        .await
        .unwrap();

    assert!(!downloaded);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!dest.exists());
    assert!(!dest.with_extension("tmp").exists());
}

#[tokio::test]
async fn failed_artifacts_are_retried_next_time() {
    let (base, hits) = not_found_server().await;
    let home = TempDir::new().unwrap();
    let g = Gpt4All::new(ChatModel::LoraQuantized, home.path())
        .with_urls(format!("{base}/gpt4all"), format!("{base}/weights.bin"));

    g.ensure_artifacts(false).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!g.has_executable());
    assert!(!g.has_model());

    g.ensure_artifacts(false).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert!(!g.executable_path().exists());
    assert!(!g.executable_path().with_extension("tmp").exists());
    assert!(!g.model_path().exists());
    assert!(!g.model_path().with_extension("tmp").exists());
}
