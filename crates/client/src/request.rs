use std::fmt;
use std::sync::Arc;

use drafter_primitives::{Paragraph, ParagraphId};
use drafter_spans::RawSpan;

/// Callback receiving the number of complete spans seen so far in a streamed response.
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

/// Where and as whom to send a request. Read from settings at call time.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub base_url: String,
	pub api_key: String,
}

impl Endpoint {
	pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			api_key: api_key.into(),
		}
	}

	/// Joins `path` onto the base URL.
	pub fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
	}
}

impl fmt::Debug for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Endpoint")
			.field("base_url", &self.base_url)
			.field("api_key", &"<redacted>")
			.finish()
	}
}

/// The whole document as seen when the analysis was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
	/// Non-empty paragraphs in document order.
	pub paragraphs: Vec<Paragraph>,
	pub target: ParagraphId,
}

/// One paragraph analysis call.
#[derive(Clone)]
pub struct AnalysisRequest {
	pub paragraph_id: ParagraphId,
	/// Snapshot of the paragraph content.
	pub text: String,
	pub context: Option<DocumentContext>,
	pub model: String,
	pub endpoint: Endpoint,
	pub max_tokens: u32,
	pub stream: bool,
	pub progress: Option<ProgressFn>,
}

impl fmt::Debug for AnalysisRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AnalysisRequest")
			.field("paragraph_id", &self.paragraph_id)
			.field("text_len", &self.text.len())
			.field("context", &self.context.as_ref().map(|c| c.paragraphs.len()))
			.field("model", &self.model)
			.field("endpoint", &self.endpoint)
			.field("max_tokens", &self.max_tokens)
			.field("stream", &self.stream)
			.finish_non_exhaustive()
	}
}

/// Decoded service output. Offsets are still untrusted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResponse {
	pub spans: Vec<RawSpan>,
	/// Accumulated model text the spans were decoded from.
	pub raw_text: String,
}

impl AnalysisResponse {
	pub fn from_text(raw_text: String) -> Self {
		Self {
			spans: drafter_spans::parse_spans(&raw_text),
			raw_text,
		}
	}
}
