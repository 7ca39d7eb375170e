use std::path::Path;

use super::generator::Generator;
use super::lstm::LstmModel;
use super::params::ModelParameters;
use super::request::GenerationRequest;
use super::vocabulary::VocabularyTable;
use crate::config::{ArtifactPaths, ModelConfig};
use crate::error::{LmError, Result};

/// Everything generation reads: the vocabulary and the model.
///
/// Built once at startup and then only shared by reference (or `Arc`).
/// Construction either fully succeeds or fails, a partially loaded context
/// never exists.
///
/// # Invariants
/// - The vocabulary size equals the model's vocabulary size
#[derive(Clone, Debug)]
pub struct InferenceContext {
	vocab: VocabularyTable,
	model: LstmModel,
}

impl InferenceContext {
	/// # Errors
	/// Returns `ArtifactLoad` if the vocabulary and the model disagree on
	/// the vocabulary size.
	pub fn new(vocab: VocabularyTable, model: LstmModel) -> Result<Self> {
		if vocab.len() != model.vocab_size() {
			return Err(LmError::ArtifactLoad(format!(
				"vocabulary has {} tokens but the model expects {}",
				vocab.len(),
				model.vocab_size()
			)));
		}
		Ok(Self { vocab, model })
	}

	/// Loads the three artifacts of a model directory.
	///
	/// # Parameters
	/// - `dir`: Directory holding `vocab.bin`, `itos.bin` and
	///   `best-model.bin`. Both `"folder"` and `"folder/"` are accepted.
	/// - `config`: Expected architecture.
	///
	/// # Errors
	/// - I/O or codec errors if an artifact is missing or malformed
	/// - `CorruptVocabulary` if the vocabulary artifacts disagree
	/// - `ArtifactLoad` if a tensor does not match `config` or the
	///   vocabulary size
	pub fn load<P: AsRef<Path>>(dir: P, config: ModelConfig) -> Result<Self> {
		Self::load_paths(&ArtifactPaths::in_dir(dir), config)
	}

	/// Same as `load`, with explicit artifact locations.
	pub fn load_paths(paths: &ArtifactPaths, config: ModelConfig) -> Result<Self> {
		config.validate()?;
		let vocab = VocabularyTable::load(&paths.vocab, &paths.itos)?;
		let params = ModelParameters::load(&paths.model, &config, vocab.len())?;
		let context = Self::new(vocab, LstmModel::new(config, params)?)?;
		log::info!(
			"Inference context ready: {} tokens, {} layers of {} units",
			context.vocab.len(),
			config.num_layers,
			config.hidden_dim
		);
		Ok(context)
	}

	/// Context with freshly initialized, untrained weights.
	///
	/// Useful for demos and tests that must not depend on a trained
	/// artifact. The same `seed` always yields the same weights.
	pub fn cold_start(vocab: VocabularyTable, config: ModelConfig, seed: u64) -> Result<Self> {
		let params = ModelParameters::init(&config, vocab.len(), seed);
		Self::new(vocab, LstmModel::new(config, params)?)
	}

	/// Writes the artifacts that `load` reads.
	pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
		let paths = ArtifactPaths::in_dir(dir);
		self.vocab.save(&paths.vocab, &paths.itos)?;
		self.model.params().save(&paths.model)?;
		log::debug!("Saved artifacts to {}", paths.model.display());
		Ok(())
	}

	pub fn vocabulary(&self) -> &VocabularyTable {
		&self.vocab
	}

	pub fn model(&self) -> &LstmModel {
		&self.model
	}

	pub fn config(&self) -> &ModelConfig {
		self.model.config()
	}

	pub fn generator(&self) -> Generator<'_> {
		Generator::new(self)
	}

	/// Validates the parameters and runs one generation.
	///
	/// # Errors
	/// Returns `InvalidParameter` if `temperature <= 0` or
	/// `max_new_tokens < 0`, see `Generator::generate` for the rest.
	pub fn generate(&self, prompt: &str, max_new_tokens: i64, temperature: f32, seed: u64) -> Result<String> {
		let request = GenerationRequest::new(prompt, max_new_tokens, temperature, seed)?;
		self.generator().generate(&request)
	}
}
