use drafter_client::{AnalysisResponse, ClientError};
use drafter_primitives::ParagraphId;
use drafter_worker::{TaskId, TaskToken};
use tokio::time::Instant;

/// Why an analysis was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	/// The paragraph's quiet period elapsed.
	Debounced,
	/// The paragraph was split and is analyzed without waiting.
	Split,
	/// Requested directly by a consumer.
	Explicit,
}

impl Trigger {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Debounced => "debounced",
			Self::Split => "split",
			Self::Explicit => "explicit",
		}
	}
}

/// One non-terminal analysis. At most one exists per paragraph.
#[derive(Debug)]
pub(crate) struct AnalysisTask {
	pub(crate) token: TaskToken,
	/// Paragraph content when the task was dispatched.
	pub(crate) snapshot: String,
	pub(crate) started_at: Instant,
	pub(crate) trigger: Trigger,
	pub(crate) correction_window: usize,
	pub(crate) preview_chars: usize,
}

impl AnalysisTask {
	pub(crate) fn id(&self) -> TaskId {
		self.token.id()
	}
}

/// Message sent from a spawned analysis back to the dispatcher's owner.
#[derive(Debug)]
pub struct TaskMessage {
	pub task: TaskId,
	pub paragraph: ParagraphId,
	pub kind: TaskMessageKind,
}

#[derive(Debug)]
pub enum TaskMessageKind {
	/// Number of complete spans streamed so far.
	Progress(usize),
	Done(Result<AnalysisResponse, ClientError>),
}
