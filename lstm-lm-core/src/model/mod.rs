//! Top-level module for the recurrent language model.
//!
//! This module provides:
//! - The vocabulary table (`VocabularyTable`)
//! - Model parameters, recurrent state and the LSTM forward pass
//! - Temperature sampling (`Sampler`)
//! - Generation requests and the high-level engine (`Generator`)
//! - The startup-built `InferenceContext` tying them together

/// Bidirectional token ↔ id mapping with an unknown-token fallback.
pub mod vocabulary;

/// Dense matrices and the few numeric kernels inference needs.
pub mod linalg;

/// Persisted tensors of the model, cold-start initialization and shape
/// checks.
pub mod params;

/// Per-call hidden and cell state.
pub mod state;

/// Embedding, stacked LSTM and output projection.
pub mod lstm;

/// Seeded temperature-scaled categorical sampling.
pub mod sampler;

/// Validated generation parameters.
pub mod request;

/// Autoregressive decode loop.
pub mod generator;

/// Loaded vocabulary and model, shared read-only by all requests.
pub mod context;
