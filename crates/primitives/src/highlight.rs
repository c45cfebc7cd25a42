use std::fmt;

use serde::{Serialize, Serializer};

use crate::{CharIdx, IssueType, ParagraphId, Priority};

/// Identifier of a highlight: owning paragraph plus the span's position in the
/// validated result. Renders as `highlight-{paragraph}-{index}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighlightId {
	paragraph: ParagraphId,
	index: u32,
}

impl HighlightId {
	pub fn new(paragraph: ParagraphId, index: u32) -> Self {
		Self { paragraph, index }
	}

	pub fn paragraph(&self) -> &ParagraphId {
		&self.paragraph
	}

	pub const fn index(&self) -> u32 {
		self.index
	}
}

impl fmt::Display for HighlightId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "highlight-{}-{}", self.paragraph, self.index)
	}
}

impl Serialize for HighlightId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// A validated, offset-corrected span ready for display.
///
/// At validation time `0 <= start_index < end_index <= len(content)` and the
/// content slice `[start_index, end_index)` equals `full_text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
	pub id: HighlightId,
	pub paragraph_id: ParagraphId,
	#[serde(rename = "type")]
	pub issue_type: IssueType,
	pub priority: Priority,
	pub start_index: CharIdx,
	pub end_index: CharIdx,
	/// Truncated preview of `full_text`.
	pub text: String,
	pub full_text: String,
	/// Reasoning from the service.
	pub note: String,
	pub confidence: f32,
}

impl Highlight {
	/// Length of the highlighted range in chars.
	pub fn len(&self) -> usize {
		self.end_index.saturating_sub(self.start_index)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Half-open interval overlap test.
	pub fn overlaps(&self, other: &Highlight) -> bool {
		!(self.end_index <= other.start_index || self.start_index >= other.end_index)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn highlight(start: usize, end: usize) -> Highlight {
		Highlight {
			id: HighlightId::new("p1".into(), 0),
			paragraph_id: "p1".into(),
			issue_type: IssueType::Clarity,
			priority: Priority::Low,
			start_index: start,
			end_index: end,
			text: String::new(),
			full_text: String::new(),
			note: String::new(),
			confidence: 0.5,
		}
	}

	#[test]
	fn id_renders_with_paragraph_and_index() {
		assert_eq!(HighlightId::new("p7".into(), 3).to_string(), "highlight-p7-3");
	}

	#[test]
	fn adjacent_ranges_do_not_overlap() {
		assert!(!highlight(0, 5).overlaps(&highlight(5, 10)));
		assert!(highlight(0, 10).overlaps(&highlight(5, 20)));
		assert!(highlight(5, 20).overlaps(&highlight(0, 10)));
		assert!(highlight(2, 3).overlaps(&highlight(0, 10)));
	}

	#[test]
	fn serializes_with_wire_field_names() {
		let value = serde_json::to_value(highlight(0, 4)).unwrap();
		assert_eq!(value["id"], "highlight-p1-0");
		assert_eq!(value["paragraphId"], "p1");
		assert_eq!(value["type"], "clarity");
		assert_eq!(value["startIndex"], 0);
		assert_eq!(value["endIndex"], 4);
	}
}
