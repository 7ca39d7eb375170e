use super::linalg::{affine, sigmoid};
use super::params::{LayerParameters, ModelParameters};
use super::state::RecurrentState;
use crate::config::ModelConfig;
use crate::error::{LmError, Result};

/// Raw, unnormalized scores for every input position.
///
/// Shape is `[batch_size, seq_len, vocab_size]`, stored flat.
#[derive(Clone, Debug, PartialEq)]
pub struct Logits {
	batch_size: usize,
	seq_len: usize,
	vocab_size: usize,
	data: Vec<f32>,
}

impl Logits {
	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	pub fn seq_len(&self) -> usize {
		self.seq_len
	}

	pub fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	/// Scores at time step `step` of batch row `batch`.
	///
	/// Panics if either index is out of bounds.
	pub fn at(&self, batch: usize, step: usize) -> &[f32] {
		assert!(batch < self.batch_size && step < self.seq_len, "logits index out of bounds");
		let start = (batch * self.seq_len + step) * self.vocab_size;
		&self.data[start..start + self.vocab_size]
	}

	/// Scores at the last position of batch row `batch`, `None` for an empty
	/// sequence.
	pub fn last(&self, batch: usize) -> Option<&[f32]> {
		if self.seq_len == 0 || batch >= self.batch_size {
			return None;
		}
		Some(self.at(batch, self.seq_len - 1))
	}
}

/// Embedding, stacked LSTM layers and a linear projection to the
/// vocabulary.
///
/// The model is a pure function of its parameters: the recurrent state is
/// passed in and handed back by every call, never stored. Dropout only
/// exists at training time and is never applied here.
#[derive(Clone, Debug)]
pub struct LstmModel {
	config: ModelConfig,
	params: ModelParameters,
}

impl LstmModel {
	/// Wraps checked parameters.
	///
	/// # Errors
	/// Returns `InvalidParameter` for an invalid configuration and
	/// `ArtifactLoad` when a tensor does not match it.
	pub fn new(config: ModelConfig, params: ModelParameters) -> Result<Self> {
		config.validate()?;
		params.validate(&config, params.vocab_size())?;
		Ok(Self { config, params })
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	pub fn params(&self) -> &ModelParameters {
		&self.params
	}

	pub fn vocab_size(&self) -> usize {
		self.params.vocab_size()
	}

	/// Zero state sized for this model.
	pub fn zero_state(&self, batch_size: usize) -> RecurrentState {
		RecurrentState::zeros(self.config.num_layers, batch_size, self.config.hidden_dim)
	}

	/// Runs a batch of id sequences through the network.
	///
	/// Every row of `input_ids` must have the same length and the batch size
	/// must match `state`. Returns the logits of every position and the
	/// state after the last one.
	///
	/// # Errors
	/// - `InvalidParameter` on a ragged batch or a state of the wrong shape
	/// - `InvalidTokenId` if an id is outside the vocabulary
	pub fn step<S: AsRef<[usize]>>(&self, input_ids: &[S], mut state: RecurrentState) -> Result<(Logits, RecurrentState)> {
		let batch_size = input_ids.len();
		self.check_state(&state, batch_size)?;

		let seq_len = input_ids.first().map_or(0, |row| row.as_ref().len());
		if input_ids.iter().any(|row| row.as_ref().len() != seq_len) {
			return Err(LmError::InvalidParameter("all batch rows must have the same length".to_owned()));
		}

		let vocab_size = self.vocab_size();
		let mut data = Vec::with_capacity(batch_size * seq_len * vocab_size);

		for (batch, row) in input_ids.iter().enumerate() {
			let mut sequence = row
				.as_ref()
				.iter()
				.map(|id| self.embed(*id).map(<[f32]>::to_vec))
				.collect::<Result<Vec<_>>>()?;

			for (index, layer) in self.params.layers.iter().enumerate() {
				let (h, c) = state.slot_mut(index, batch);
				for x in sequence.iter_mut() {
					Self::cell(layer, x, h, c);
					x.clear();
					x.extend_from_slice(h);
				}
			}

			for output in &sequence {
				data.extend(self.project(output));
			}
		}

		Ok((Logits { batch_size, seq_len, vocab_size, data }, state))
	}

	/// Logits obtained from the top layer hidden vector of `state`.
	///
	/// This is what the network predicts before consuming any token; for a
	/// zero state it reduces to the output bias.
	pub fn project_state(&self, state: &RecurrentState, batch: usize) -> Result<Vec<f32>> {
		self.check_state(state, state.batch_size())?;
		if batch >= state.batch_size() {
			return Err(LmError::InvalidParameter(format!(
				"batch row {batch} outside of state batch size {}",
				state.batch_size()
			)));
		}
		Ok(self.project(state.hidden(self.config.num_layers - 1, batch)))
	}

	fn check_state(&self, state: &RecurrentState, batch_size: usize) -> Result<()> {
		if batch_size == 0 {
			return Err(LmError::InvalidParameter("batch must not be empty".to_owned()));
		}
		if state.num_layers() != self.config.num_layers
			|| state.hidden_dim() != self.config.hidden_dim
			|| state.batch_size() != batch_size
		{
			return Err(LmError::InvalidParameter(format!(
				"state shape [{}, {}, {}] does not match [{}, {}, {}]",
				state.num_layers(),
				state.batch_size(),
				state.hidden_dim(),
				self.config.num_layers,
				batch_size,
				self.config.hidden_dim
			)));
		}
		Ok(())
	}

	fn embed(&self, id: usize) -> Result<&[f32]> {
		if id >= self.vocab_size() {
			return Err(LmError::InvalidTokenId { id, vocab_size: self.vocab_size() });
		}
		Ok(self.params.embedding.row(id))
	}

	/// One LSTM time step, updating `h` and `c` in place.
	fn cell(layer: &LayerParameters, x: &[f32], h: &mut [f32], c: &mut [f32]) {
		let hidden_dim = h.len();
		let mut gates = affine(&layer.weight_ih, x, &layer.bias_ih);
		layer.weight_hh.matvec_add(h, &mut gates);
		for (gate, bias) in gates.iter_mut().zip(&layer.bias_hh) {
			*gate += bias;
		}

		let (input, rest) = gates.split_at(hidden_dim);
		let (forget, rest) = rest.split_at(hidden_dim);
		let (candidate, output) = rest.split_at(hidden_dim);

		for k in 0..hidden_dim {
			c[k] = sigmoid(forget[k]) * c[k] + sigmoid(input[k]) * candidate[k].tanh();
			h[k] = sigmoid(output[k]) * c[k].tanh();
		}
	}

	fn project(&self, hidden: &[f32]) -> Vec<f32> {
		affine(&self.params.output_weight, hidden, &self.params.output_bias)
	}
}
