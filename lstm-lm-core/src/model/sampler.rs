use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::linalg::softmax_with_temperature;
use crate::error::{LmError, Result};

/// Temperature-scaled categorical sampler over logits.
///
/// Owns the only random stream of a generation call. It is seeded once and
/// every draw of the decode loop comes from it, so identical seeds replay
/// identical sequences.
#[derive(Clone, Debug)]
pub struct Sampler {
	temperature: f32,
	rng: ChaCha8Rng,
}

impl Sampler {
	/// # Errors
	/// Returns `InvalidParameter` if `temperature` is not a finite value
	/// strictly greater than zero.
	pub fn new(temperature: f32, seed: u64) -> Result<Self> {
		check_temperature(temperature)?;
		Ok(Self { temperature, rng: ChaCha8Rng::seed_from_u64(seed) })
	}

	pub fn temperature(&self) -> f32 {
		self.temperature
	}

	/// Probability distribution obtained from `logits / temperature`.
	pub fn probabilities(&self, logits: &[f32]) -> Vec<f32> {
		softmax_with_temperature(logits, self.temperature)
	}

	/// Draws one token id.
	///
	/// Uses an inverse CDF walk over the probabilities. Rounding can leave the
	/// cumulative sum slightly below the draw, in which case the last token
	/// with a non-zero probability is returned.
	///
	/// # Errors
	/// Returns `Internal` for empty logits or logits that do not form a
	/// distribution (NaN scores, or no finite score at all). Such logits can
	/// only come from a broken model, never from the request.
	pub fn sample(&mut self, logits: &[f32]) -> Result<usize> {
		let probs = self.probabilities(logits);
		if probs.is_empty() || probs.iter().any(|p| !p.is_finite()) {
			return Err(LmError::Internal("logits do not form a probability distribution".to_owned()));
		}

		let coin: f32 = self.rng.random();
		let mut cdf = 0.0;
		let mut fallback = 0;
		for (id, p) in probs.iter().enumerate() {
			if *p > 0.0 {
				cdf += p;
				fallback = id;
				if coin < cdf {
					return Ok(id);
				}
			}
		}
		Ok(fallback)
	}
}

/// Rejects temperatures that would divide by zero, flip or poison the
/// logits.
pub(crate) fn check_temperature(temperature: f32) -> Result<()> {
	if !temperature.is_finite() || temperature <= 0.0 {
		return Err(LmError::InvalidParameter(format!("temperature must be > 0, got {temperature}")));
	}
	Ok(())
}
