//! Minimal dense linear algebra over flat `f32` buffers.
//!
//! Only what inference needs: matrix-vector products, element-wise
//! nonlinearities and a numerically stable softmax.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Row-major dense matrix.
///
/// # Invariants
/// - `data.len() == rows * cols`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Matrix {
	rows: usize,
	cols: usize,
	data: Vec<f32>,
}

impl Matrix {
	pub fn zeros(rows: usize, cols: usize) -> Self {
		Self { rows, cols, data: vec![0.0; rows * cols] }
	}

	/// Wraps a row-major buffer.
	///
	/// Returns `None` if `data` does not hold exactly `rows * cols` values.
	pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
		if rows.checked_mul(cols) != Some(data.len()) {
			return None;
		}
		Some(Self { rows, cols, data })
	}

	/// Builds a matrix by evaluating `f` once per element, row by row.
	pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut() -> f32) -> Self {
		let data = (0..rows * cols).map(|_| f()).collect();
		Self { rows, cols, data }
	}

	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn cols(&self) -> usize {
		self.cols
	}

	/// Returns `true` when `data` still matches the declared shape.
	///
	/// Only matters for matrices decoded from an artifact.
	pub fn is_consistent(&self) -> bool {
		self.rows.checked_mul(self.cols) == Some(self.data.len())
	}

	/// Panics if `index >= rows`.
	pub fn row(&self, index: usize) -> &[f32] {
		&self.data[index * self.cols..(index + 1) * self.cols]
	}

	pub fn row_mut(&mut self, index: usize) -> &mut [f32] {
		&mut self.data[index * self.cols..(index + 1) * self.cols]
	}

	/// Accumulates `self · x` into `out` (`out += self · x`).
	///
	/// Panics if `x.len() != cols` or `out.len() != rows`.
	pub fn matvec_add(&self, x: &[f32], out: &mut [f32]) {
		assert_eq!(x.len(), self.cols, "matvec input length");
		assert_eq!(out.len(), self.rows, "matvec output length");
		for (row, acc) in self.data.chunks_exact(self.cols).zip(out.iter_mut()) {
			*acc += dot(row, x);
		}
	}
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Computes `w · x + b` into a new vector.
pub fn affine(w: &Matrix, x: &[f32], b: &[f32]) -> Vec<f32> {
	let mut out = b.to_vec();
	w.matvec_add(x, &mut out);
	out
}

pub fn sigmoid(x: f32) -> f32 {
	1.0 / (1.0 + (-x).exp())
}

/// Normalized exponential of `logits`.
///
/// The maximum is subtracted before exponentiating so large logits cannot
/// overflow. The result sums to 1.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
	softmax_with_temperature(logits, 1.0)
}

/// Normalized exponential of `logits / temperature`.
///
/// The maximum is subtracted before dividing, so the top score is always
/// exactly 0 and any positive temperature, however small, can only push the
/// others towards 0 instead of overflowing.
pub fn softmax_with_temperature(logits: &[f32], temperature: f32) -> Vec<f32> {
	let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
	let mut probs: Vec<f32> = logits.iter().map(|l| ((l - max) / temperature).exp()).collect();
	let sum: f32 = probs.iter().sum();
	for p in &mut probs {
		*p /= sum;
	}
	probs
}

/// Index of the largest value, the first one on ties.
///
/// Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<usize> {
	values
		.iter()
		.enumerate()
		.max_by(|(ia, a), (ib, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal).then(ib.cmp(ia)))
		.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn matvec_with_bias() {
		let w = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 0.0, -1.0, 0.5]).unwrap();
		let out = affine(&w, &[1.0, 1.0, 2.0], &[0.5, -0.5]);
		assert_eq!(out, vec![9.5, -0.5]);
	}

	#[test]
	fn from_vec_checks_shape() {
		assert!(Matrix::from_vec(2, 2, vec![0.0; 3]).is_none());
		let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
		assert_eq!(m.row(1), &[3.0, 4.0]);
		assert!(m.is_consistent());
	}

	#[test]
	fn softmax_is_stable_for_large_logits() {
		let probs = softmax(&[1000.0, 1001.0, 999.0]);
		assert!(probs.iter().all(|p| p.is_finite()));
		let sum: f32 = probs.iter().sum();
		assert!((sum - 1.0).abs() < 1e-6);
		assert!(probs[1] > probs[0] && probs[0] > probs[2]);
	}

	#[test]
	fn tiny_temperature_concentrates_on_max() {
		let probs = softmax_with_temperature(&[0.0, 0.0, 5.0, 1.0], f32::MIN_POSITIVE);
		assert_eq!(probs, vec![0.0, 0.0, 1.0, 0.0]);
	}

	#[test]
	fn overflowing_shape_is_inconsistent() {
		// rows * cols wraps to 0 and would match the empty buffer.
		let rows = 1 << (usize::BITS - 1);
		let m = Matrix { rows, cols: 2, data: Vec::new() };
		assert!(!m.is_consistent());
		assert!(Matrix::from_vec(rows, 2, Vec::new()).is_none());
	}

	#[test]
	fn softmax_of_equal_logits_is_uniform() {
		let probs = softmax(&[3.0; 4]);
		for p in probs {
			assert!((p - 0.25).abs() < 1e-6);
		}
	}

	#[test]
	fn argmax_prefers_first_on_ties() {
		assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
		assert_eq!(argmax(&[]), None);
	}

	#[test]
	fn sigmoid_midpoint() {
		assert_eq!(sigmoid(0.0), 0.5);
		assert!(sigmoid(20.0) > 0.999);
	}
}
