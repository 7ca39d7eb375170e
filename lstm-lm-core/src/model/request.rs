use super::sampler::check_temperature;
use crate::error::{LmError, Result};

/// Number of tokens generated when the caller does not say.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 20;
/// Sampling temperature used when the caller does not say.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Seed used when the caller does not say.
pub const DEFAULT_SEED: u64 = 42;

/// Validated input of a single generation call.
///
/// Construction is the only place parameters are checked, so a
/// `GenerationRequest` that exists can always be decoded.
///
/// # Invariants
/// - `temperature` is finite and strictly positive
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
	prompt: String,
	max_new_tokens: usize,
	temperature: f32,
	seed: u64,
}

impl GenerationRequest {
	/// Creates a request.
	///
	/// `max_new_tokens` is signed so that callers forwarding untrusted input
	/// get a proper rejection instead of a silent wrap-around.
	///
	/// # Errors
	/// Returns `InvalidParameter` if `max_new_tokens < 0` or
	/// `temperature <= 0`.
	pub fn new(prompt: impl Into<String>, max_new_tokens: i64, temperature: f32, seed: u64) -> Result<Self> {
		let max_new_tokens = usize::try_from(max_new_tokens).map_err(|_| {
			LmError::InvalidParameter(format!("max_new_tokens must be >= 0, got {max_new_tokens}"))
		})?;
		check_temperature(temperature)?;
		Ok(Self { prompt: prompt.into(), max_new_tokens, temperature, seed })
	}

	pub fn prompt(&self) -> &str {
		&self.prompt
	}

	pub fn max_new_tokens(&self) -> usize {
		self.max_new_tokens
	}

	pub fn temperature(&self) -> f32 {
		self.temperature
	}

	pub fn seed(&self) -> u64 {
		self.seed
	}
}

impl Default for GenerationRequest {
	fn default() -> Self {
		Self {
			prompt: String::new(),
			max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
			temperature: DEFAULT_TEMPERATURE,
			seed: DEFAULT_SEED,
		}
	}
}
