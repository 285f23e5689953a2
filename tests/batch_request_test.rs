mod helpers;

use helpers::test_tokenizer;
use nomic_client::embedding::request::{batch_requests, create_request_for_batch};
use nomic_client::embedding::{ModelRegistry, TextEmbeddingModel};

fn pad_id(registry: &ModelRegistry) -> u32 {
    registry
        .get(TextEmbeddingModel::NomicEmbedTextV1_5)
        .unwrap()
        .pad_id
}

#[test]
fn shorter_sequence_mask_is_zero_padded() {
    let registry = ModelRegistry::default();
    let (_tmp, tok) = test_tokenizer(&registry);

    let req = create_request_for_batch(&["hello", "a longer sentence"], &tok, pad_id(&registry))
        .unwrap();

    assert_eq!(req.shape(), [2, 3]);
    assert_eq!(req.input_ids().shape(), req.attention_mask().shape());
    assert_eq!(req.input_ids().row(0).to_vec(), vec![2, 0, 0]);
    assert_eq!(req.input_ids().row(1).to_vec(), vec![3, 4, 5]);
    assert_eq!(req.attention_mask().row(0).to_vec(), vec![1, 0, 0]);
    assert_eq!(req.attention_mask().row(1).to_vec(), vec![1, 1, 1]);
}

#[test]
fn empty_text_in_batch_gets_placeholder_tokens() {
    let registry = ModelRegistry::default();
    let (_tmp, tok) = test_tokenizer(&registry);

    let req = create_request_for_batch(&["", "hello world"], &tok, pad_id(&registry)).unwrap();
    assert_eq!(req.shape(), [2, 2]);
    assert_eq!(req.attention_mask().row(0).to_vec(), vec![1, 0]);
}

#[test]
fn batches_split_by_size() {
    let registry = ModelRegistry::default();
    let (_tmp, tok) = test_tokenizer(&registry);
    let texts: Vec<String> = (0..5).map(|i| format!("hello {i}")).collect();

    let shapes: Vec<[usize; 2]> = batch_requests(&texts, &tok, pad_id(&registry), 2)
        .unwrap()
        .map(|r| r.unwrap().shape())
        .collect();
    assert_eq!(shapes, vec![[2, 2], [2, 2], [1, 2]]);
}

#[test]
fn zero_batch_size_is_rejected() {
    let registry = ModelRegistry::default();
    let (_tmp, tok) = test_tokenizer(&registry);
    assert!(batch_requests(&["hello"], &tok, 0, 0).is_err());
}

#[test]
fn request_body_is_header_then_tensors() {
    let registry = ModelRegistry::default();
    let (_tmp, tok) = test_tokenizer(&registry);

    let req = create_request_for_batch(&["hello", "a longer sentence"], &tok, 0).unwrap();
    let n = req.json_header_size();
    let header: serde_json::Value = serde_json::from_slice(&req.body()[..n]).unwrap();
    assert_eq!(header["inputs"][0]["shape"], serde_json::json!([2, 3]));
    assert_eq!(header["inputs"][1]["shape"], serde_json::json!([2, 3]));
    // two INT32 tensors of 2x3
    assert_eq!(req.body().len() - n, 2 * 6 * 4);
}
