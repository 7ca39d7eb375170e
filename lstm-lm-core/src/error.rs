use thiserror::Error;

/// Errors raised by the language model library.
///
/// Startup errors (`CorruptVocabulary`, `ArtifactLoad`, `Io`, `Codec`) mean the
/// inference context must not be served. `InvalidParameter` is a rejected
/// request. `InvalidTokenId`, `OutOfRange` and `Internal` are broken
/// contracts between the vocabulary, the model and the sampler.
#[derive(Debug, Error)]
pub enum LmError {
	#[error("corrupt vocabulary: {0}")]
	CorruptVocabulary(String),

	#[error("artifact load error: {0}")]
	ArtifactLoad(String),

	#[error("invalid parameter: {0}")]
	InvalidParameter(String),

	#[error("invalid token id {id} (vocabulary size {vocab_size})")]
	InvalidTokenId { id: usize, vocab_size: usize },

	#[error("token id {id} out of range (vocabulary size {vocab_size})")]
	OutOfRange { id: usize, vocab_size: usize },

	#[error("internal error: {0}")]
	Internal(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("artifact codec error: {0}")]
	Codec(#[from] postcard::Error),
}

impl LmError {
	/// Returns `true` when the error was caused by the caller's input
	/// rather than by the loaded artifacts or an internal bug.
	pub fn is_client_error(&self) -> bool {
		matches!(self, LmError::InvalidParameter(_))
	}
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, LmError>;
