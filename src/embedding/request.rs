//! Binary inference request bodies for a Triton embedding endpoint.
//!
//! Each batch becomes two `INT32` tensors, `input_ids` and `attention_mask`,
//! both shaped `[batch, max_len]`, serialized with the KServe v2 binary tensor
//! extension: a JSON header followed by the raw little-endian tensor data in
//! input order. The endpoint is asked to return the `embedding` output in
//! binary form as well.

use anyhow::{bail, Result};
use ndarray::Array2;
use serde::Serialize;
use tokenizers::Tokenizer;

use super::tokenize_text;

/// Name of the output tensor requested from the endpoint.
pub const EMBEDDING_OUTPUT: &str = "embedding";

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Serialize)]
struct InferHeader<'a> {
    inputs: Vec<InputTensor<'a>>,
    outputs: Vec<OutputTensor<'a>>,
}

#[derive(Serialize)]
struct InputTensor<'a> {
    name: &'a str,
    shape: [usize; 2],
    datatype: &'a str,
    parameters: InputParameters,
}

#[derive(Serialize)]
struct InputParameters {
    binary_data_size: usize,
}

#[derive(Serialize)]
struct OutputTensor<'a> {
    name: &'a str,
    parameters: OutputParameters,
}

#[derive(Serialize)]
struct OutputParameters {
    binary_data: bool,
}

/// One serialized batch, ready to POST.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    input_ids: Array2<i32>,
    attention_mask: Array2<i32>,
    body: Vec<u8>,
    json_header_size: usize,
}

impl InferenceRequest {
    /// Pack token sequences into padded tensors and serialize them.
    pub fn from_tokens(tokens: &[Vec<u32>], pad_id: u32) -> Result<Self> {
        if tokens.is_empty() {
            bail!("cannot build an inference request from an empty batch");
        }
        let max_len = tokens.iter().map(Vec::len).max().unwrap_or(0);

        let mut input_ids = Array2::from_elem((tokens.len(), max_len), pad_id as i32);
        let mut attention_mask = Array2::<i32>::zeros((tokens.len(), max_len));
        for (row, ids) in tokens.iter().enumerate() {
            for (col, &id) in ids.iter().enumerate() {
                input_ids[[row, col]] = id as i32;
                attention_mask[[row, col]] = 1;
            }
        }

        let (body, json_header_size) = encode_body(&input_ids, &attention_mask)?;
        Ok(Self {
            input_ids,
            attention_mask,
            body,
            json_header_size,
        })
    }

    pub fn input_ids(&self) -> &Array2<i32> {
        &self.input_ids
    }

    pub fn attention_mask(&self) -> &Array2<i32> {
        &self.attention_mask
    }

    /// `[batch, max_len]`
    pub fn shape(&self) -> [usize; 2] {
        let (rows, cols) = self.input_ids.dim();
        [rows, cols]
    }

    /// JSON header followed by binary tensor data.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take the body without copying it.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Length of the JSON prefix of [`body`](Self::body), sent as the
    /// `Inference-Header-Content-Length` header.
    pub fn json_header_size(&self) -> usize {
        self.json_header_size
    }

    /// Content type for a SageMaker Triton endpoint invocation.
    pub fn content_type(&self) -> String {
        format!(
            "application/vnd.sagemaker-triton.binary+json;json-header-size={}",
            self.json_header_size
        )
    }
}

fn encode_body(input_ids: &Array2<i32>, attention_mask: &Array2<i32>) -> Result<(Vec<u8>, usize)> {
    let (rows, cols) = input_ids.dim();
    let data_size = rows * cols * std::mem::size_of::<i32>();
    let tensor = |name: &'static str| InputTensor {
        name,
        shape: [rows, cols],
        datatype: "INT32",
        parameters: InputParameters {
            binary_data_size: data_size,
        },
    };
    let header = InferHeader {
        inputs: vec![tensor("input_ids"), tensor("attention_mask")],
        outputs: vec![OutputTensor {
            name: EMBEDDING_OUTPUT,
            parameters: OutputParameters { binary_data: true },
        }],
    };

    let mut body = serde_json::to_vec(&header)?;
    let json_header_size = body.len();
    body.reserve(2 * data_size);
    // Row-major iteration matches the declared shape.
    for array in [input_ids, attention_mask] {
        for v in array.iter() {
            body.extend_from_slice(&v.to_le_bytes());
        }
    }
    Ok((body, json_header_size))
}

/// Tokenize `texts` and build one request for the whole batch.
pub fn create_request_for_batch<S: AsRef<str>>(
    texts: &[S],
    tokenizer: &Tokenizer,
    pad_id: u32,
) -> Result<InferenceRequest> {
    let tokens = texts
        .iter()
        .map(|t| tokenize_text(tokenizer, t.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    InferenceRequest::from_tokens(&tokens, pad_id)
}

/// Lazily yield one request per `batch_size` texts.
///
/// Batch size should match what the endpoint's GPU is provisioned for.
pub fn batch_requests<'a, S: AsRef<str>>(
    texts: &'a [S],
    tokenizer: &'a Tokenizer,
    pad_id: u32,
    batch_size: usize,
) -> Result<impl Iterator<Item = Result<InferenceRequest>> + 'a> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }
    Ok(texts
        .chunks(batch_size)
        .map(move |chunk| create_request_for_batch(chunk, tokenizer, pad_id)))
}
