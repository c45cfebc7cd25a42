//! Error types for the remote analysis client.

use thiserror::Error;

/// Failure of one call to the reasoning service.
#[derive(Debug, Error)]
pub enum ClientError {
	/// No API key was supplied with the request.
	#[error("missing API key")]
	MissingCredentials,

	/// Non-success HTTP status.
	#[error("service returned HTTP {status}: {body}")]
	Status { status: u16, body: String },

	/// Error event inside an otherwise successful stream.
	#[error("service reported an error: {0}")]
	Remote(String),

	/// Connection, TLS, or body read failure.
	#[error("transport error: {0}")]
	Transport(String),

	/// Response body did not have the expected shape.
	#[error("undecodable response: {0}")]
	Decode(String),

	/// The call's cancellation token fired.
	#[error("analysis cancelled")]
	Cancelled,
}

/// Coarse failure classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Credentials are missing or rejected. Not retried.
	Configuration,
	/// HTTP or network failure.
	Transport,
	/// The response could not be decoded at all.
	Parse,
	/// Not a failure; the result is dropped.
	Cancelled,
}

impl ErrorKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Configuration => "configuration",
			Self::Transport => "transport",
			Self::Parse => "parse",
			Self::Cancelled => "cancelled",
		}
	}
}

impl ClientError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingCredentials => ErrorKind::Configuration,
			Self::Status { status: 401 | 403, .. } => ErrorKind::Configuration,
			Self::Status { .. } | Self::Remote(_) | Self::Transport(_) => ErrorKind::Transport,
			Self::Decode(_) => ErrorKind::Parse,
			Self::Cancelled => ErrorKind::Cancelled,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

impl From<reqwest::Error> for ClientError {
	fn from(error: reqwest::Error) -> Self {
		if error.is_decode() {
			Self::Decode(error.to_string())
		} else {
			Self::Transport(error.to_string())
		}
	}
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
