use std::io;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware, post, web};

use serde::{Deserialize, Serialize};
use lstm_lm_core::model::request::{DEFAULT_MAX_NEW_TOKENS, DEFAULT_SEED, DEFAULT_TEMPERATURE};
use lstm_lm_core::{GenerationRequest, InferenceContext, LmError, ModelConfig, transliterate};

/// Server settings, read from the environment.
#[derive(Debug, PartialEq)]
struct ServerConfig {
	/// Directory holding `vocab.bin`, `itos.bin` and `best-model.bin`.
	model_dir: PathBuf,
	/// Address the HTTP server binds to.
	bind: String,
	/// Largest `max_len` a client may ask for.
	max_new_tokens_limit: usize,
}

impl ServerConfig {
	/// Builds the configuration from `LSTM_LM_*` variables, falling back
	/// to defaults for unset ones.
	fn from_env() -> Result<Self, String> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
		let max_new_tokens_limit = match lookup("LSTM_LM_MAX_NEW_TOKENS") {
			Some(value) => value
				.trim()
				.parse::<usize>()
				.map_err(|_| format!("LSTM_LM_MAX_NEW_TOKENS must be a positive integer, got {value:?}"))?,
			None => 512,
		};

		Ok(Self {
			model_dir: PathBuf::from(lookup("LSTM_LM_MODEL_DIR").unwrap_or_else(|| "./model".to_owned())),
			bind: lookup("LSTM_LM_BIND").unwrap_or_else(|| "127.0.0.1:8000".to_owned()),
			max_new_tokens_limit,
		})
	}
}

/// JSON body of the `/api/generate/` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	prompt: Option<String>,
	max_len: Option<i64>,
	temperature: Option<f32>,
	seed: Option<Seed>,
}

/// Any JSON integer that fits 64 bits, negative ones included.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
enum Seed {
	Unsigned(u64),
	Signed(i64),
}

impl Seed {
	/// Negative seeds keep their two's complement bits, so `-1` and
	/// `18446744073709551615` name the same random stream.
	fn bits(self) -> u64 {
		match self {
			Seed::Unsigned(seed) => seed,
			Seed::Signed(seed) => seed as u64,
		}
	}
}

#[derive(Deserialize)]
struct TransliterateParams {
	text: Option<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
	generated: String,
}

#[derive(Serialize)]
struct TransliterateResponse {
	transliterated: String,
}

#[derive(Serialize)]
struct ModelInfo {
	vocab_size: usize,
	embedding_dim: usize,
	hidden_dim: usize,
	num_layers: usize,
	max_new_tokens_limit: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
	error: String,
}

struct SharedData {
	context: InferenceContext,
	max_new_tokens_limit: usize,
}

impl GenerateParams {
	/// Fills missing fields with defaults and validates the request.
	fn request(self, max_new_tokens_limit: usize) -> Result<GenerationRequest, LmError> {
		let max_len = self.max_len.unwrap_or(DEFAULT_MAX_NEW_TOKENS as i64);
		// Negative lengths are left to `GenerationRequest::new`.
		if usize::try_from(max_len).is_ok_and(|n| n > max_new_tokens_limit) {
			return Err(LmError::InvalidParameter(format!(
				"max_len must be <= {max_new_tokens_limit}, got {max_len}"
			)));
		}
		GenerationRequest::new(
			self.prompt.unwrap_or_default(),
			max_len,
			self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
			self.seed.map_or(DEFAULT_SEED, Seed::bits),
		)
	}
}

/// Maps a library error to a JSON error response.
///
/// Bad parameters are the client's fault (400), anything else means the
/// loaded model is broken (500).
fn error_response(error: &LmError) -> HttpResponse {
	let body = ErrorResponse { error: error.to_string() };
	if error.is_client_error() {
		HttpResponse::BadRequest().json(body)
	} else {
		log::error!("Request failed: {error}");
		HttpResponse::InternalServerError().json(body)
	}
}

/// Answers bodies that do not deserialize with the same JSON error shape as
/// every other rejected request.
fn json_error(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
	log::warn!("Rejected request body: {error}");
	let body = ErrorResponse { error: format!("invalid parameter: {error}") };
	InternalError::from_response(error, HttpResponse::BadRequest().json(body)).into()
}

/// HTTP POST endpoint `/api/generate/`
///
/// Generates text from a prompt. Generation is CPU-bound, so it runs on
/// the blocking thread pool with its own state and random stream.
#[post("/api/generate/")]
async fn generate_text(data: web::Data<SharedData>, params: web::Json<GenerateParams>) -> impl Responder {
	let request = match params.into_inner().request(data.max_new_tokens_limit) {
		Ok(r) => r,
		Err(e) => return error_response(&e),
	};

	log::info!(
		"Received prompt: {}, max_len: {}, temperature: {}",
		request.prompt(),
		request.max_new_tokens(),
		request.temperature()
	);

	let shared_data = data.clone();
	let result = web::block(move || shared_data.context.generator().generate(&request)).await;

	match result {
		Ok(Ok(generated)) => {
			log::info!("Generated text: {generated}");
			HttpResponse::Ok().json(GenerateResponse { generated })
		}
		Ok(Err(e)) => error_response(&e),
		Err(e) => HttpResponse::InternalServerError().json(ErrorResponse { error: format!("Generation task failed: {e}") }),
	}
}

/// HTTP POST endpoint `/api/transliterate/`
#[post("/api/transliterate/")]
async fn transliterate_text(params: web::Json<TransliterateParams>) -> impl Responder {
	let text = params.into_inner().text.unwrap_or_default();
	HttpResponse::Ok().json(TransliterateResponse { transliterated: transliterate(&text) })
}

#[get("/api/model/")]
async fn get_model(data: web::Data<SharedData>) -> impl Responder {
	let config = data.context.config();
	HttpResponse::Ok().json(ModelInfo {
		vocab_size: data.context.vocabulary().len(),
		embedding_dim: config.embedding_dim,
		hidden_dim: config.hidden_dim,
		num_layers: config.num_layers,
		max_new_tokens_limit: data.max_new_tokens_limit,
	})
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.app_data(web::JsonConfig::default().error_handler(json_error))
		.service(generate_text)
		.service(transliterate_text)
		.service(get_model);
}

/// Main entry point for the server.
///
/// Loads the artifacts once, shares them read-only between workers and
/// starts the Actix-web HTTP server.
///
/// # Notes
/// - Refuses to start if any artifact is missing or inconsistent.
/// - `RUST_LOG` controls the log level (default `info`).
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env().map_err(io::Error::other)?;
	let context = InferenceContext::load(&config.model_dir, ModelConfig::default()).map_err(|e| {
		log::error!("Failed to load model from {}: {e}", config.model_dir.display());
		io::Error::other(e)
	})?;

	let shared_data = web::Data::new(SharedData {
		context,
		max_new_tokens_limit: config.max_new_tokens_limit,
	});

	log::info!("Listening on {}", config.bind);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.wrap(middleware::Logger::default())
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind(config.bind.as_str())?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use lstm_lm_core::VocabularyTable;
	use serde_json::{Value, json};

	fn shared_data() -> web::Data<SharedData> {
		let vocab = VocabularyTable::from_tokens(["<unk>", "हाम्रो", "देश", "नेपाल", "हो"]).unwrap();
		let config = ModelConfig { embedding_dim: 4, hidden_dim: 4, num_layers: 2, dropout: 0.3 };
		let context = InferenceContext::cold_start(vocab, config, 1).unwrap();
		web::Data::new(SharedData { context, max_new_tokens_limit: 50 })
	}

	#[actix_web::test]
	async fn generate_returns_prompt_and_new_tokens() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		let req = test::TestRequest::post()
			.uri("/api/generate/")
			.set_json(json!({ "prompt": "हाम्रो देश", "max_len": 4, "temperature": 0.8, "seed": 3 }))
			.to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		let generated = body["generated"].as_str().unwrap();
		assert!(generated.starts_with("हाम्रो देश "));
		assert_eq!(generated.split(' ').count(), 6);
	}

	#[actix_web::test]
	async fn generate_is_reproducible_and_uses_defaults() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		let mut outputs = Vec::new();
		for _ in 0..2 {
			let req = test::TestRequest::post().uri("/api/generate/").set_json(json!({})).to_request();
			let body: Value = test::call_and_read_body_json(&app, req).await;
			outputs.push(body["generated"].as_str().unwrap().to_owned());
		}
		assert_eq!(outputs[0], outputs[1]);
		assert_eq!(outputs[0].split(' ').count(), DEFAULT_MAX_NEW_TOKENS);
	}

	#[actix_web::test]
	async fn invalid_parameters_are_bad_requests() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		for body in [
			json!({ "prompt": "नेपाल", "temperature": 0.0 }),
			json!({ "prompt": "नेपाल", "temperature": -1.0 }),
			json!({ "prompt": "नेपाल", "max_len": -2 }),
			json!({ "prompt": "नेपाल", "max_len": 51 }),
		] {
			let req = test::TestRequest::post().uri("/api/generate/").set_json(body).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
			let body: Value = test::read_body_json(resp).await;
			assert!(body["error"].as_str().unwrap().starts_with("invalid parameter"));
		}
	}

	#[actix_web::test]
	async fn negative_seeds_are_accepted_and_reproducible() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		let mut outputs = Vec::new();
		for seed in [json!(-7), json!(-7), json!(u64::MAX - 6)] {
			let req = test::TestRequest::post()
				.uri("/api/generate/")
				.set_json(json!({ "prompt": "नेपाल", "max_len": 6, "temperature": 1.0, "seed": seed }))
				.to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::OK);
			let body: Value = test::read_body_json(resp).await;
			outputs.push(body["generated"].as_str().unwrap().to_owned());
		}
		assert_eq!(outputs[0], outputs[1]);
		assert_eq!(outputs[0], outputs[2]);
	}

	#[actix_web::test]
	async fn malformed_bodies_get_json_errors() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		for body in [
			json!({ "prompt": "नेपाल", "seed": "abc" }),
			json!({ "prompt": "नेपाल", "max_len": "x" }),
			json!({ "prompt": "नेपाल", "seed": 1.5 }),
		] {
			let req = test::TestRequest::post().uri("/api/generate/").set_json(body).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
			let body: Value = test::read_body_json(resp).await;
			assert!(body["error"].as_str().unwrap().starts_with("invalid parameter"));
		}
	}

	#[::core::prelude::v1::test]
	fn unbounded_limit_does_not_wrap() {
		let params = GenerateParams { prompt: None, max_len: Some(5), temperature: None, seed: None };
		assert_eq!(params.request(usize::MAX).unwrap().max_new_tokens(), 5);

		let params = GenerateParams { prompt: None, max_len: Some(i64::MAX), temperature: None, seed: None };
		assert!(params.request(usize::MAX).is_ok());

		let params = GenerateParams { prompt: None, max_len: Some(-1), temperature: None, seed: None };
		assert!(matches!(params.request(usize::MAX), Err(LmError::InvalidParameter(_))));
	}

	#[::core::prelude::v1::test]
	fn seed_bits() {
		assert_eq!(Seed::Signed(-1).bits(), u64::MAX);
		assert_eq!(Seed::Unsigned(42).bits(), 42);
	}

	#[actix_web::test]
	async fn transliterate_endpoint() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		let req = test::TestRequest::post()
			.uri("/api/transliterate/")
			.set_json(json!({ "text": "Hamra Nepal Ho" }))
			.to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["transliterated"], "हाम्रा नेपाल हो");

		let req = test::TestRequest::post().uri("/api/transliterate/").set_json(json!({})).to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["transliterated"], "");
	}

	#[actix_web::test]
	async fn model_info_reports_architecture() {
		let app = test::init_service(App::new().app_data(shared_data()).configure(routes)).await;
		let req = test::TestRequest::get().uri("/api/model/").to_request();
		let body: Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["vocab_size"], 5);
		assert_eq!(body["num_layers"], 2);
		assert_eq!(body["max_new_tokens_limit"], 50);
	}

	#[::core::prelude::v1::test]
	fn config_defaults_and_overrides() {
		let config = ServerConfig::from_lookup(|_| None).unwrap();
		assert_eq!(config.model_dir, PathBuf::from("./model"));
		assert_eq!(config.bind, "127.0.0.1:8000");
		assert_eq!(config.max_new_tokens_limit, 512);

		let config = ServerConfig::from_lookup(|key| match key {
			"LSTM_LM_BIND" => Some("0.0.0.0:9000".to_owned()),
			"LSTM_LM_MAX_NEW_TOKENS" => Some("64".to_owned()),
			_ => None,
		})
		.unwrap();
		assert_eq!(config.bind, "0.0.0.0:9000");
		assert_eq!(config.max_new_tokens_limit, 64);

		assert!(ServerConfig::from_lookup(|_| Some("many".to_owned())).is_err());
	}
}
