use std::path::PathBuf;

/// Library-level structured errors for nfsconf.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid operation: {reason}")]
	InvalidOperation { reason: String },

	#[error("Invalid base64 payload")]
	InvalidBase64 {
		#[source]
		source: base64::DecodeError,
	},

	#[error("Output buffer too small for decoded payload ({available} bytes available)")]
	BufferTooSmall { available: usize },

	#[error("Logger error: {0}")]
	Logger(String),
}

/// Result type alias using ConfError.
pub type Result<T> = std::result::Result<T, ConfError>;

#[cfg(test)]
mod tests {
	use super::*;
	use std::error::Error;

	#[test]
	fn test_not_found_display() {
		let e = ConfError::ConfigNotFound {
			path: PathBuf::from("/etc/nfs.conf"),
		};
		assert!(e.to_string().contains("/etc/nfs.conf"));
	}

	#[test]
	fn test_read_error_keeps_source() {
		let e = ConfError::ConfigReadError {
			path: PathBuf::from("nfs.conf"),
			source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
		};
		assert!(e.source().is_some());
	}
}
