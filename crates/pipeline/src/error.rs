//! Error types for the pipeline.

use drafter_config::ConfigError;
use thiserror::Error;

/// Reasons a dispatch could not start.
#[derive(Debug, Error)]
pub enum DispatchError {
	/// Settings cannot produce a request (usually a missing API key).
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Failures of [`SessionHandle`](crate::SessionHandle) calls.
#[derive(Debug, Error)]
pub enum SessionError {
	/// The session loop has exited.
	#[error("analysis session has shut down")]
	Closed,

	#[error(transparent)]
	Dispatch(#[from] DispatchError),
}

/// Result type for dispatcher operations.
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
