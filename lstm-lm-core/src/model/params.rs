use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::linalg::Matrix;
use crate::config::ModelConfig;
use crate::error::{LmError, Result};
use crate::io::{read_artifact, write_artifact};

/// Number of LSTM gates stacked in every weight matrix (input, forget,
/// cell candidate, output, in that row order).
pub const GATES: usize = 4;

/// Weights of one LSTM layer.
///
/// # Invariants
/// - `weight_ih` is `[4 * hidden_dim, input_dim]`
/// - `weight_hh` is `[4 * hidden_dim, hidden_dim]`
/// - both biases hold `4 * hidden_dim` values
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerParameters {
	pub weight_ih: Matrix,
	pub weight_hh: Matrix,
	pub bias_ih: Vec<f32>,
	pub bias_hh: Vec<f32>,
}

/// Every tensor of the recurrent language model.
///
/// Built once (from an artifact or a cold start) and only read afterwards.
///
/// # Invariants
/// - `embedding` is `[vocab_size, embedding_dim]`
/// - `layers.len() == num_layers`
/// - `output_weight` is `[vocab_size, hidden_dim]`, one row per token
/// - `output_bias` holds `vocab_size` values
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelParameters {
	pub embedding: Matrix,
	pub layers: Vec<LayerParameters>,
	pub output_weight: Matrix,
	pub output_bias: Vec<f32>,
}

impl ModelParameters {
	/// All-zero parameters with the shapes required by `config`.
	pub fn zeros(config: &ModelConfig, vocab_size: usize) -> Self {
		let gates = GATES * config.hidden_dim;
		let layers = (0..config.num_layers)
			.map(|layer| LayerParameters {
				weight_ih: Matrix::zeros(gates, Self::input_dim(config, layer)),
				weight_hh: Matrix::zeros(gates, config.hidden_dim),
				bias_ih: vec![0.0; gates],
				bias_hh: vec![0.0; gates],
			})
			.collect();

		Self {
			embedding: Matrix::zeros(vocab_size, config.embedding_dim),
			layers,
			output_weight: Matrix::zeros(vocab_size, config.hidden_dim),
			output_bias: vec![0.0; vocab_size],
		}
	}

	/// Cold-start parameters, reproducible for a given `seed`.
	///
	/// - Embedding weights are uniform in `[-0.1, 1/sqrt(hidden_dim))`
	/// - Recurrent and projection weights are uniform in
	///   `[-1/sqrt(hidden_dim), 1/sqrt(hidden_dim))`
	/// - Every bias is zero
	pub fn init(config: &ModelConfig, vocab_size: usize, seed: u64) -> Self {
		let mut rng = ChaCha8Rng::seed_from_u64(seed);
		let range = 1.0 / (config.hidden_dim as f32).sqrt();
		let gates = GATES * config.hidden_dim;

		let embedding = Matrix::from_fn(vocab_size, config.embedding_dim, || rng.random_range(-0.1..range));
		let layers = (0..config.num_layers)
			.map(|layer| LayerParameters {
				weight_ih: Matrix::from_fn(gates, Self::input_dim(config, layer), || rng.random_range(-range..range)),
				weight_hh: Matrix::from_fn(gates, config.hidden_dim, || rng.random_range(-range..range)),
				bias_ih: vec![0.0; gates],
				bias_hh: vec![0.0; gates],
			})
			.collect();
		let output_weight = Matrix::from_fn(vocab_size, config.hidden_dim, || rng.random_range(-range..range));

		Self { embedding, layers, output_weight, output_bias: vec![0.0; vocab_size] }
	}

	/// Loads parameters from a postcard artifact and checks them against
	/// the expected architecture.
	///
	/// # Errors
	/// - I/O or codec error if the file cannot be read or decoded
	/// - `ArtifactLoad` if a tensor shape does not match
	pub fn load<P: AsRef<Path>>(path: P, config: &ModelConfig, vocab_size: usize) -> Result<Self> {
		let params: Self = read_artifact(&path)?;
		params.validate(config, vocab_size)?;
		log::debug!(
			"Loaded model parameters from {} ({} layers, vocabulary {})",
			path.as_ref().display(),
			params.layers.len(),
			vocab_size
		);
		Ok(params)
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		write_artifact(path, self)
	}

	/// Vocabulary size implied by the embedding table.
	pub fn vocab_size(&self) -> usize {
		self.embedding.rows()
	}

	/// Checks every tensor shape against `config` and `vocab_size`.
	///
	/// # Errors
	/// Returns `ArtifactLoad` describing the first mismatch found.
	pub fn validate(&self, config: &ModelConfig, vocab_size: usize) -> Result<()> {
		let gates = GATES * config.hidden_dim;

		check_matrix("embedding", &self.embedding, vocab_size, config.embedding_dim)?;
		if self.layers.len() != config.num_layers {
			return Err(LmError::ArtifactLoad(format!(
				"expected {} layers, artifact has {}",
				config.num_layers,
				self.layers.len()
			)));
		}
		for (index, layer) in self.layers.iter().enumerate() {
			check_matrix(&format!("layer {index} weight_ih"), &layer.weight_ih, gates, Self::input_dim(config, index))?;
			check_matrix(&format!("layer {index} weight_hh"), &layer.weight_hh, gates, config.hidden_dim)?;
			check_len(&format!("layer {index} bias_ih"), &layer.bias_ih, gates)?;
			check_len(&format!("layer {index} bias_hh"), &layer.bias_hh, gates)?;
		}
		check_matrix("output weight", &self.output_weight, vocab_size, config.hidden_dim)?;
		check_len("output bias", &self.output_bias, vocab_size)
	}

	fn input_dim(config: &ModelConfig, layer: usize) -> usize {
		if layer == 0 { config.embedding_dim } else { config.hidden_dim }
	}
}

fn check_matrix(name: &str, matrix: &Matrix, rows: usize, cols: usize) -> Result<()> {
	if !matrix.is_consistent() || matrix.rows() != rows || matrix.cols() != cols {
		return Err(LmError::ArtifactLoad(format!(
			"{name}: expected [{rows}, {cols}], found [{}, {}]",
			matrix.rows(),
			matrix.cols()
		)));
	}
	Ok(())
}

fn check_len(name: &str, values: &[f32], len: usize) -> Result<()> {
	if values.len() != len {
		return Err(LmError::ArtifactLoad(format!("{name}: expected {len} values, found {}", values.len())));
	}
	Ok(())
}
