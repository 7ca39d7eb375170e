//! Recurrent language model text generation library.
//!
//! This crate provides:
//! - A vocabulary table with unknown-token fallback
//! - A multi-layer LSTM language model over flat `f32` tensors
//! - Seeded, temperature-scaled autoregressive generation
//! - A static romanized Nepali → Devanagari transliteration helper
//!
//! Artifacts are postcard-encoded and loaded once into an
//! `InferenceContext`, which is then shared read-only.

/// Vocabulary, model, sampling and generation.
pub mod model;

/// Model architecture and artifact locations.
pub mod config;

/// Library error type.
pub mod error;

/// Dictionary transliteration.
pub mod transliterate;

/// Artifact file helpers.
///
/// Not exposed
pub(crate) mod io;

pub use config::{ArtifactPaths, ModelConfig};
pub use error::{LmError, Result};
pub use model::context::InferenceContext;
pub use model::generator::Generator;
pub use model::request::GenerationRequest;
pub use model::vocabulary::VocabularyTable;
pub use transliterate::transliterate;
