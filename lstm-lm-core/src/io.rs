use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Reads a postcard-encoded artifact from disk.
///
/// - Reads the entire file into memory
/// - Decodes it as `T`
pub(crate) fn read_artifact<T, P>(path: P) -> Result<T>
where
	T: DeserializeOwned,
	P: AsRef<Path>,
{
	let bytes = fs::read(path.as_ref())?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Encodes `value` with postcard and writes it to `path`.
///
/// Parent directories are created when missing.
pub(crate) fn write_artifact<T, P>(path: P, value: &T) -> Result<()>
where
	T: Serialize,
	P: AsRef<Path>,
{
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dot_resolves_to_current_dir() {
		let expected = env::current_dir().unwrap();
		assert_eq!(normalize_folder("."), expected);
		assert_eq!(normalize_folder("./"), expected);
		assert_eq!(normalize_folder("model"), PathBuf::from("model"));
	}

	#[test]
	fn artifact_round_trip_creates_parent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("values.bin");
		write_artifact(&path, &vec![1u32, 2, 3]).unwrap();
		let values: Vec<u32> = read_artifact(&path).unwrap();
		assert_eq!(values, vec![1, 2, 3]);
	}

	#[test]
	fn missing_artifact_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let result: Result<Vec<u32>> = read_artifact(dir.path().join("absent.bin"));
		assert!(matches!(result, Err(crate::error::LmError::Io(_))));
	}
}
