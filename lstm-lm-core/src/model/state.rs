/// Hidden and cell state of a stacked LSTM.
///
/// Both tensors have the shape `[num_layers, batch_size, hidden_dim]` and
/// are stored flat in that order.
///
/// A state belongs to exactly one generation call: it is created zeroed at
/// the start of the call and moved through the model at every step, so two
/// requests can never observe each other's memory.
///
/// ## Invariants
/// - `hidden.len() == cell.len() == num_layers * batch_size * hidden_dim`
#[derive(Clone, Debug, PartialEq)]
pub struct RecurrentState {
	num_layers: usize,
	batch_size: usize,
	hidden_dim: usize,
	/// Output of each layer at the last consumed time step.
	hidden: Vec<f32>,
	/// Long-term memory channel of each layer.
	cell: Vec<f32>,
}

impl RecurrentState {
	/// Creates a zero-valued state.
	pub fn zeros(num_layers: usize, batch_size: usize, hidden_dim: usize) -> Self {
		let len = num_layers * batch_size * hidden_dim;
		Self {
			num_layers,
			batch_size,
			hidden_dim,
			hidden: vec![0.0; len],
			cell: vec![0.0; len],
		}
	}

	pub fn num_layers(&self) -> usize {
		self.num_layers
	}

	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	pub fn hidden_dim(&self) -> usize {
		self.hidden_dim
	}

	fn offset(&self, layer: usize, batch: usize) -> usize {
		assert!(layer < self.num_layers && batch < self.batch_size, "state index out of bounds");
		(layer * self.batch_size + batch) * self.hidden_dim
	}

	/// Hidden vector of one layer for one batch row.
	pub fn hidden(&self, layer: usize, batch: usize) -> &[f32] {
		let start = self.offset(layer, batch);
		&self.hidden[start..start + self.hidden_dim]
	}

	/// Cell vector of one layer for one batch row.
	pub fn cell(&self, layer: usize, batch: usize) -> &[f32] {
		let start = self.offset(layer, batch);
		&self.cell[start..start + self.hidden_dim]
	}

	/// Mutable hidden and cell vectors of one layer for one batch row.
	pub(crate) fn slot_mut(&mut self, layer: usize, batch: usize) -> (&mut [f32], &mut [f32]) {
		let start = self.offset(layer, batch);
		let end = start + self.hidden_dim;
		(&mut self.hidden[start..end], &mut self.cell[start..end])
	}

	/// Returns `true` if every hidden and cell value is zero.
	pub fn is_zero(&self) -> bool {
		self.hidden.iter().chain(&self.cell).all(|v| *v == 0.0)
	}
}
