use super::context::InferenceContext;
use super::request::GenerationRequest;
use super::sampler::Sampler;
use crate::error::{LmError, Result};

/// Splits a prompt into whitespace-delimited tokens.
///
/// Pure and locale-independent; an empty or blank prompt yields no tokens.
pub fn tokenize(prompt: &str) -> Vec<&str> {
	prompt.split_whitespace().collect()
}

/// Autoregressive text generation over a loaded `InferenceContext`.
///
/// # Responsibilities
/// - Tokenize the prompt and map it through the vocabulary
/// - Prime a fresh recurrent state with the whole prompt in one pass
/// - Sample `max_new_tokens` tokens, feeding each one back alone
/// - Join prompt and generated tokens with single spaces
///
/// A `Generator` holds no mutable data. Each call builds its own state and
/// random stream, so one generator can serve any number of threads.
#[derive(Clone, Copy, Debug)]
pub struct Generator<'a> {
	context: &'a InferenceContext,
}

impl<'a> Generator<'a> {
	pub fn new(context: &'a InferenceContext) -> Self {
		Self { context }
	}

	/// Generates text and returns the prompt followed by the new tokens.
	///
	/// # Errors
	/// - `InvalidParameter` for a bad request (checked before any work)
	/// - `InvalidTokenId` / `OutOfRange` if the model and vocabulary
	///   disagree, `Internal` if the model yields unusable logits; both are
	///   logged as errors
	pub fn generate(&self, request: &GenerationRequest) -> Result<String> {
		let generated = self.generate_tokens(request)?;
		let mut words = tokenize(request.prompt());
		words.extend(generated.iter().map(String::as_str));
		Ok(words.join(" "))
	}

	/// Generates only the new tokens, without the prompt.
	///
	/// Always returns exactly `max_new_tokens` tokens: there is no end of
	/// sequence token, the whole budget is spent.
	pub fn generate_tokens(&self, request: &GenerationRequest) -> Result<Vec<String>> {
		self.decode(request).inspect_err(|e| {
			if !e.is_client_error() {
				log::error!("Generation aborted on a broken invariant: {e}");
			}
		})
	}

	fn decode(&self, request: &GenerationRequest) -> Result<Vec<String>> {
		let vocab = self.context.vocabulary();
		let model = self.context.model();
		let budget = request.max_new_tokens();

		// Seeded before anything else so a bad temperature fails without
		// side effects.
		let mut sampler = Sampler::new(request.temperature(), request.seed())?;

		let ids: Vec<usize> = tokenize(request.prompt()).into_iter().map(|t| vocab.lookup(t)).collect();
		log::debug!("Tokenized prompt into {} ids, generating {budget} tokens", ids.len());

		let mut generated = Vec::with_capacity(budget);
		if budget == 0 {
			return Ok(generated);
		}

		// Priming. An empty prompt samples its first token from the zero
		// state's projection.
		let state = model.zero_state(1);
		let (mut logits, mut state) = if ids.is_empty() {
			(model.project_state(&state, 0)?, state)
		} else {
			let (logits, state) = model.step(&[ids.as_slice()], state)?;
			(last_position(&logits)?, state)
		};

		for produced in 1..=budget {
			let id = sampler.sample(&logits)?;
			generated.push(vocab.reverse(id)?.to_owned());

			if produced < budget {
				let (next, next_state) = model.step(&[[id]], state)?;
				logits = last_position(&next)?;
				state = next_state;
			}
		}

		Ok(generated)
	}
}

fn last_position(logits: &super::lstm::Logits) -> Result<Vec<f32>> {
	logits
		.last(0)
		.map(<[f32]>::to_vec)
		.ok_or_else(|| LmError::Internal("model produced no logits".to_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ModelConfig;
	use crate::model::linalg::argmax;
	use crate::model::lstm::LstmModel;
	use crate::model::params::ModelParameters;
	use crate::model::vocabulary::VocabularyTable;

	fn config() -> ModelConfig {
		ModelConfig { embedding_dim: 4, hidden_dim: 6, num_layers: 2, dropout: 0.3 }
	}

	/// Vocabulary of the cat scenario, with a model whose logits are its
	/// output bias whatever the input.
	fn biased_context(bias: [f32; 4]) -> InferenceContext {
		let vocab = VocabularyTable::from_tokens(["<unk>", "the", "cat", "sat"]).unwrap();
		let mut params = ModelParameters::zeros(&config(), 4);
		params.output_bias = bias.to_vec();
		InferenceContext::new(vocab, LstmModel::new(config(), params).unwrap()).unwrap()
	}

	fn random_context() -> InferenceContext {
		let tokens = ["<unk>", "हाम्रो", "देश", "नेपाल", "हो", "सुन्दर", "छ", "।"];
		let vocab = VocabularyTable::from_tokens(tokens).unwrap();
		InferenceContext::cold_start(vocab, config(), 5).unwrap()
	}

	fn request(prompt: &str, max_new_tokens: i64, temperature: f32, seed: u64) -> GenerationRequest {
		GenerationRequest::new(prompt, max_new_tokens, temperature, seed).unwrap()
	}

	#[test]
	fn tokenize_splits_on_any_whitespace() {
		assert_eq!(tokenize("  the\tcat \n sat "), vec!["the", "cat", "sat"]);
		assert!(tokenize("").is_empty());
		assert!(tokenize("   ").is_empty());
	}

	#[test]
	fn cat_dominates_at_low_temperature() {
		let context = biased_context([0.0, 0.0, 5.0, 1.0]);
		let output = context.generator().generate(&request("the", 2, 0.01, 1)).unwrap();
		assert_eq!(output, "the cat cat");
	}

	#[test]
	fn identical_inputs_identical_outputs() {
		let context = random_context();
		let generator = context.generator();
		for seed in [0, 1, 42, u64::MAX] {
			let a = generator.generate(&request("हाम्रो देश", 12, 1.0, seed)).unwrap();
			let b = generator.generate(&request("हाम्रो देश", 12, 1.0, seed)).unwrap();
			assert_eq!(a, b);
		}
	}

	#[test]
	fn seeds_change_the_sampled_sequence() {
		let context = random_context();
		let generator = context.generator();
		let outputs: std::collections::HashSet<String> = (0..20)
			.map(|seed| generator.generate(&request("नेपाल", 10, 5.0, seed)).unwrap())
			.collect();
		assert!(outputs.len() > 1);
	}

	#[test]
	fn length_contract() {
		let context = random_context();
		let generator = context.generator();
		for budget in [1, 3, 17] {
			let tokens = generator.generate_tokens(&request("हाम्रो", budget, 0.7, 3)).unwrap();
			assert_eq!(tokens.len(), budget as usize);
		}
	}

	#[test]
	fn zero_budget_returns_rejoined_prompt() {
		let context = random_context();
		let generator = context.generator();
		assert_eq!(generator.generate(&request("  हाम्रो   देश\tहो ", 0, 1.0, 0)).unwrap(), "हाम्रो देश हो");
		assert_eq!(generator.generate(&request("", 0, 1.0, 0)).unwrap(), "");
	}

	#[test]
	fn unknown_prompt_words_do_not_fail() {
		let context = random_context();
		let output = context.generator().generate(&request("hello world", 4, 1.0, 9)).unwrap();
		let words = tokenize(&output);
		assert_eq!(&words[..2], &["hello", "world"]);
		assert_eq!(words.len(), 6);
	}

	#[test]
	fn empty_prompt_starts_from_zero_state() {
		// Zero state projects to the output bias, so the first token follows
		// the bias alone.
		let context = biased_context([0.0, 0.0, 0.0, 8.0]);
		let output = context.generator().generate(&request("", 3, 0.01, 4)).unwrap();
		assert_eq!(output, "sat sat sat");
	}

	#[test]
	fn low_temperature_matches_argmax_decoding() {
		let bias = [0.5, 2.0, 1.0, 0.0];
		let context = biased_context(bias);
		let best = context.vocabulary().reverse(argmax(&bias).unwrap()).unwrap().to_owned();
		for seed in 0..100 {
			let tokens = context.generator().generate_tokens(&request("sat", 5, 0.01, seed)).unwrap();
			assert!(tokens.iter().all(|t| *t == best));
		}
	}

	#[test]
	fn smallest_positive_temperature_still_generates() {
		let context = biased_context([0.0, 0.0, 5.0, 1.0]);
		assert_eq!(context.generate("the", 2, f32::MIN_POSITIVE, 1).unwrap(), "the cat cat");
		assert_eq!(context.generate("the", 2, 1.0e-38, 1).unwrap(), "the cat cat");
	}

	#[test]
	fn missing_logits_are_an_internal_error() {
		let context = random_context();
		let model = context.model();
		let empty: [&[usize]; 1] = [&[]];
		let (logits, _) = model.step(&empty, model.zero_state(1)).unwrap();
		let err = last_position(&logits).unwrap_err();
		assert!(matches!(err, LmError::Internal(_)));
		assert!(!err.is_client_error());
	}

	#[test]
	fn invalid_temperature_is_rejected() {
		assert!(matches!(GenerationRequest::new("the", 2, 0.0, 1), Err(LmError::InvalidParameter(_))));
		assert!(matches!(GenerationRequest::new("the", 2, -1.0, 1), Err(LmError::InvalidParameter(_))));
	}
}
