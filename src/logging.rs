//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, before loading any configuration.

use crate::error::{ConfError, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber, writing to stderr.
///
/// `level` takes precedence when given; otherwise `RUST_LOG` is used, falling
/// back to `default_level`.
pub fn init(level: Option<&str>, default_level: &str) -> Result<()> {
	let filter = match level {
		Some(level) => {
			parse_level(level)?;
			EnvFilter::try_new(level)
				.map_err(|e| ConfError::Logger(format!("invalid log level '{level}': {e}")))?
		}
		None => EnvFilter::try_from_default_env()
			.or_else(|_| EnvFilter::try_new(default_level))
			.map_err(|e| ConfError::Logger(format!("invalid log level '{default_level}': {e}")))?,
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|e| ConfError::Logger(format!("failed to set subscriber: {e}")))
}

/// Parse a log level string into a [`LevelFilter`], rejecting unknown values.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
	if level.is_empty() {
		return Err(ConfError::Logger("log level must not be empty".into()));
	}
	level
		.parse::<LevelFilter>()
		.map_err(|_| ConfError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_valid_levels_parse() {
		for l in ["error", "warn", "info", "debug", "trace", "off"] {
			assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
		}
	}

	#[test]
	fn test_invalid_level_errors() {
		assert!(parse_level("verbose").is_err());
		assert!(parse_level("").is_err());
	}

	#[test]
	fn test_init_rejects_bad_level() {
		assert!(matches!(init(Some("loud"), "warn"), Err(ConfError::Logger(_))));
	}
}
