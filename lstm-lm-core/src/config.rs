use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LmError, Result};
use crate::io;

/// File name of the token → id mapping inside a model directory.
pub const VOCAB_FILE: &str = "vocab.bin";
/// File name of the id → token list inside a model directory.
pub const ITOS_FILE: &str = "itos.bin";
/// File name of the model parameters inside a model directory.
pub const MODEL_FILE: &str = "best-model.bin";

/// Architecture of the recurrent language model.
///
/// The vocabulary size is not part of the configuration: it always comes
/// from the loaded vocabulary table.
///
/// # Invariants
/// - All dimensions are strictly positive
/// - `dropout` is within `[0.0, 1.0)`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ModelConfig {
	/// Size of each embedding vector.
	pub embedding_dim: usize,
	/// Size of the hidden and cell state of every layer.
	pub hidden_dim: usize,
	/// Number of stacked LSTM layers.
	pub num_layers: usize,
	/// Training-time dropout rate. Never applied during inference.
	pub dropout: f32,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self { embedding_dim: 256, hidden_dim: 256, num_layers: 2, dropout: 0.3 }
	}
}

impl ModelConfig {
	/// Checks the configuration invariants.
	///
	/// # Errors
	/// Returns `InvalidParameter` if a dimension is zero or the dropout rate
	/// is outside `[0.0, 1.0)`.
	pub fn validate(&self) -> Result<()> {
		if self.embedding_dim == 0 || self.hidden_dim == 0 || self.num_layers == 0 {
			return Err(LmError::InvalidParameter(format!(
				"model dimensions must be positive, got embedding_dim={}, hidden_dim={}, num_layers={}",
				self.embedding_dim, self.hidden_dim, self.num_layers
			)));
		}
		if !(0.0..1.0).contains(&self.dropout) {
			return Err(LmError::InvalidParameter(format!(
				"dropout must be within [0.0, 1.0), got {}",
				self.dropout
			)));
		}
		Ok(())
	}
}

/// Locations of the three persisted artifacts of a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
	pub vocab: PathBuf,
	pub itos: PathBuf,
	pub model: PathBuf,
}

impl ArtifactPaths {
	/// Builds the artifact paths for a model directory.
	///
	/// Both `"folder"` and `"folder/"` are accepted, `"."` resolves to the
	/// current working directory.
	pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
		let folder = io::normalize_folder(dir);
		Self {
			vocab: folder.join(VOCAB_FILE),
			itos: folder.join(ITOS_FILE),
			model: folder.join(MODEL_FILE),
		}
	}
}
