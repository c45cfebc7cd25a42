use drafter_client::ClientError;
use drafter_primitives::ParagraphId;

/// Observability sink for analysis failures. Failures are never retried.
pub trait FailureReporter: Send + Sync {
	fn report(&self, paragraph: &ParagraphId, error: &ClientError);
}

/// Logs failures at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
	fn report(&self, paragraph: &ParagraphId, error: &ClientError) {
		tracing::warn!(paragraph = %paragraph, kind = error.kind().as_str(), error = %error, "analysis.failed");
	}
}

/// Dispatcher counters since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
	/// Analyses started.
	pub dispatched: u64,
	/// Results written to the highlight collection.
	pub applied: u64,
	/// Results dropped because the paragraph changed during the call.
	pub stale: u64,
	/// Tasks cancelled or superseded.
	pub cancelled: u64,
	pub failed: u64,
	/// Dispatches skipped because the content was already analyzed.
	pub skipped: u64,
}
