//! Error types for settings loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or using settings.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a settings file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Malformed TOML or an unknown key.
	#[error("settings parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A value parsed but is not acceptable.
	#[error("invalid value for {field}: {message}")]
	Invalid {
		/// Settings key or environment variable.
		field: &'static str,
		message: String,
	},

	/// No API key is configured.
	#[error("missing API key: set ANTHROPIC_API_KEY or api_key in the settings file")]
	MissingCredentials,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
