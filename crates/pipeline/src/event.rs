use drafter_client::ErrorKind;
use drafter_primitives::{Highlight, HighlightId, ParagraphId};
use drafter_worker::TaskId;

/// Snapshot of everything a consumer renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightView {
	/// Every highlight, in document order then start order.
	pub highlights: Vec<Highlight>,
	/// Paragraphs with an analysis in flight, sorted by id.
	pub analyzing: Vec<ParagraphId>,
	pub selected: Option<HighlightId>,
	/// Increases whenever any other field changes.
	pub revision: u64,
}

impl HighlightView {
	pub fn for_paragraph<'a>(&'a self, paragraph: &'a ParagraphId) -> impl Iterator<Item = &'a Highlight> + 'a {
		self.highlights.iter().filter(move |h| &h.paragraph_id == paragraph)
	}

	pub fn is_analyzing(&self, paragraph: &ParagraphId) -> bool {
		self.analyzing.contains(paragraph)
	}

	pub fn selected_highlight(&self) -> Option<&Highlight> {
		let selected = self.selected.as_ref()?;
		self.highlights.iter().find(|h| &h.id == selected)
	}
}

/// Why a finished analysis was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
	/// The paragraph changed while the call was in flight.
	Stale,
	Cancelled,
	/// A newer analysis replaced it.
	Superseded,
}

/// Notifications published by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
	AnalysisStarted { paragraph: ParagraphId, task: TaskId },
	HighlightsReplaced { paragraph: ParagraphId, count: usize },
	HighlightsCleared { paragraph: ParagraphId, removed: usize },
	Discarded { paragraph: ParagraphId, reason: DiscardReason },
	Failed { paragraph: ParagraphId, kind: ErrorKind, message: String },
	/// Complete spans streamed so far for the paragraph's running analysis.
	Progress { paragraph: ParagraphId, spans: usize },
	SelectionChanged { selected: Option<HighlightId> },
}
