use std::collections::HashMap;
use std::path::Path;

use crate::error::{LmError, Result};
use crate::io::{read_artifact, write_artifact};

/// Reserved token standing for every word missing from the vocabulary.
pub const UNK_TOKEN: &str = "<unk>";

/// Bidirectional mapping between tokens and integer ids.
///
/// Built once from the two vocabulary artifacts and never mutated after.
///
/// # Invariants
/// - `token_to_id` and `id_to_token` have the same size
/// - `id_to_token[token_to_id[t]] == t` for every known token `t`
/// - `<unk>` is always present
#[derive(Clone, Debug)]
pub struct VocabularyTable {
	token_to_id: HashMap<String, usize>,
	id_to_token: Vec<String>,
	unk_id: usize,
}

impl VocabularyTable {
	/// Builds a table from the two mapping artifacts.
	///
	/// # Errors
	/// Returns `CorruptVocabulary` if the sizes disagree, if `<unk>` is
	/// missing, or if any entry breaks the round-trip invariant.
	pub fn new(token_to_id: HashMap<String, usize>, id_to_token: Vec<String>) -> Result<Self> {
		if token_to_id.len() != id_to_token.len() {
			return Err(LmError::CorruptVocabulary(format!(
				"token_to_id has {} entries but id_to_token has {}",
				token_to_id.len(),
				id_to_token.len()
			)));
		}

		let unk_id = match token_to_id.get(UNK_TOKEN) {
			Some(id) => *id,
			None => return Err(LmError::CorruptVocabulary(format!("missing {UNK_TOKEN} entry"))),
		};

		// Same size plus every entry pointing back at itself means both
		// mappings are bijective.
		for (token, id) in &token_to_id {
			match id_to_token.get(*id) {
				Some(t) if t == token => (),
				Some(t) => {
					return Err(LmError::CorruptVocabulary(format!(
						"token {token:?} maps to id {id} but id {id} maps to {t:?}"
					)));
				}
				None => {
					return Err(LmError::CorruptVocabulary(format!(
						"token {token:?} maps to id {id}, outside of {} entries",
						id_to_token.len()
					)));
				}
			}
		}

		Ok(Self { token_to_id, id_to_token, unk_id })
	}

	/// Builds a table from an ordered token list, ids follow list order.
	///
	/// # Errors
	/// Returns `CorruptVocabulary` on duplicate tokens or a missing `<unk>`.
	pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let id_to_token: Vec<String> = tokens.into_iter().map(Into::into).collect();
		let token_to_id = id_to_token
			.iter()
			.enumerate()
			.map(|(id, token)| (token.clone(), id))
			.collect();
		Self::new(token_to_id, id_to_token)
	}

	/// Loads the token → id map and the id → token list from disk.
	///
	/// # Errors
	/// Returns an I/O or codec error if a file cannot be read, and
	/// `CorruptVocabulary` if the two artifacts are inconsistent.
	pub fn load<PV, PI>(vocab_path: PV, itos_path: PI) -> Result<Self>
	where
		PV: AsRef<Path>,
		PI: AsRef<Path>,
	{
		let token_to_id: HashMap<String, usize> = read_artifact(vocab_path)?;
		let id_to_token: Vec<String> = read_artifact(itos_path)?;
		let table = Self::new(token_to_id, id_to_token)?;
		log::debug!("Loaded vocabulary with {} tokens", table.len());
		Ok(table)
	}

	/// Writes both mapping artifacts so that `load` can read them back.
	pub fn save<PV, PI>(&self, vocab_path: PV, itos_path: PI) -> Result<()>
	where
		PV: AsRef<Path>,
		PI: AsRef<Path>,
	{
		write_artifact(vocab_path, &self.token_to_id)?;
		write_artifact(itos_path, &self.id_to_token)
	}

	/// Returns the id of `token`, or the `<unk>` id if it is unknown.
	pub fn lookup(&self, token: &str) -> usize {
		self.token_to_id.get(token).copied().unwrap_or(self.unk_id)
	}

	/// Returns the token for `id`.
	///
	/// # Errors
	/// Returns `OutOfRange` if `id >= len()`.
	pub fn reverse(&self, id: usize) -> Result<&str> {
		self.id_to_token
			.get(id)
			.map(String::as_str)
			.ok_or(LmError::OutOfRange { id, vocab_size: self.len() })
	}

	pub fn unk_id(&self) -> usize {
		self.unk_id
	}

	pub fn len(&self) -> usize {
		self.id_to_token.len()
	}

	/// Always `false` for a valid table since `<unk>` is mandatory.
	pub fn is_empty(&self) -> bool {
		self.id_to_token.is_empty()
	}

	/// Iterates over tokens in id order.
	pub fn tokens(&self) -> impl Iterator<Item = &str> {
		self.id_to_token.iter().map(String::as_str)
	}
}
