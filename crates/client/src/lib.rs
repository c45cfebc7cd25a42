//! Remote Analysis Client.
//!
//! [`AnalysisClient`] is the seam between the pipeline and the reasoning service.
//! [`AnthropicClient`] implements it against the Anthropic Messages API, either as
//! one JSON response or as a Server-Sent Events stream whose partial output is
//! scanned for completed spans while it arrives.
//!
//! Every call takes a [`CancellationToken`]. Once it fires the call resolves to
//! [`ClientError::Cancelled`] promptly; in-flight I/O is dropped, not awaited.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

mod anthropic;
pub mod error;
mod feedback;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
mod models;
pub mod prompt;
mod request;
mod sse;

pub use anthropic::{ANTHROPIC_VERSION, AnthropicClient};
pub use error::{ClientError, ErrorKind, Result};
pub use feedback::{DetailedFeedback, ExplainRequest, Suggestion};
pub use models::{ModelInfo, ModelsResponse};
pub use request::{AnalysisRequest, AnalysisResponse, DocumentContext, Endpoint, ProgressFn};
pub use sse::{SseDecoder, StreamEvent};

/// Sends one paragraph to the reasoning service and returns its decoded spans.
///
/// Implementations never validate offsets; that is the caller's job against the
/// paragraph text it snapshotted.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
	async fn analyze(&self, request: AnalysisRequest, cancel: CancellationToken) -> Result<AnalysisResponse>;
}
