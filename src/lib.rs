//! Client-side helpers for Nomic models.
//!
//! Two loosely related tools live here:
//!
//! - **Embedding requests**: tokenize texts and pack them into binary
//!   inference request bodies for a Triton-served `nomic-embed-text-v1.5`
//!   endpoint, one request per batch.
//! - **Local chat**: download the prebuilt GPT4All executable and quantized
//!   weights, run the executable as a subprocess, and exchange prompts and
//!   responses over its stdin/stdout.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`chat`] — Chat subprocess lifecycle and the sentinel-terminated output reader
//! - [`download`] — Artifact downloads with progress reporting
//! - [`embedding`] — Model registry, tokenization, and request body construction

pub mod chat;
pub mod config;
pub mod download;
pub mod embedding;
