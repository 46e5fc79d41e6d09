use crate::error::{ConfError, Result};
use std::path::Path;
use tracing::warn;

/// Supplies the raw text of a config file or an included file.
pub trait Loader {
	fn load(&self, path: &Path) -> Result<String>;
}

/// Reads config files from the local filesystem.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD rather than
/// failing the load.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl Loader for FsLoader {
	fn load(&self, path: &Path) -> Result<String> {
		let bytes = std::fs::read(path).map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				ConfError::ConfigNotFound {
					path: path.to_path_buf(),
				}
			} else {
				ConfError::ConfigReadError {
					path: path.to_path_buf(),
					source,
				}
			}
		})?;

		match String::from_utf8(bytes) {
			Ok(text) => Ok(text),
			Err(err) => {
				warn!(path = %path.display(), "config file is not valid UTF-8, replacing invalid bytes");
				Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_load_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nfs.conf");
		std::fs::write(&path, "[nfsd]\nthreads = 8\n").unwrap();

		let text = FsLoader.load(&path).unwrap();
		assert!(text.contains("threads"));
	}

	#[test]
	fn test_load_tolerates_invalid_utf8() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nfs.conf");
		std::fs::write(&path, b"# caf\xe9 config\n[nfsd]\nthreads = 8\n").unwrap();

		let text = FsLoader.load(&path).unwrap();
		assert!(text.starts_with("# caf\u{fffd} config\n"));

		let mut store = crate::config::ConfStore::new();
		let warnings = store.init(Some(&path)).unwrap();
		assert!(warnings.is_empty());
		assert_eq!(store.get_str("nfsd", "threads").as_deref(), Some("8"));
	}

	#[test]
	fn test_load_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing.conf");

		match FsLoader.load(&path).unwrap_err() {
			ConfError::ConfigNotFound { path: p } => assert_eq!(p, path),
			other => panic!("Expected ConfigNotFound, got {other:?}"),
		}
	}

	#[test]
	fn test_load_directory_is_read_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(
			FsLoader.load(dir.path()),
			Err(ConfError::ConfigReadError { .. })
		));
	}
}
