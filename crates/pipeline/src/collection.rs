use drafter_primitives::{Highlight, HighlightId, IssueType, ParagraphId, Priority};
use rustc_hash::FxHashMap;

/// Result of removing a paragraph's highlights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removal {
	pub removed: usize,
	/// The selected highlight belonged to the paragraph and was deselected.
	pub selection_cleared: bool,
}

/// Every current highlight, grouped by paragraph, plus the selected one.
///
/// Mutated only by the dispatcher and session; consumers read snapshots.
#[derive(Debug, Default, Clone)]
pub struct HighlightCollection {
	by_paragraph: FxHashMap<ParagraphId, Vec<Highlight>>,
	selected: Option<HighlightId>,
}

impl HighlightCollection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces all highlights of `paragraph`. An empty list removes the entry.
	///
	/// Selection is kept only if the selected id still exists afterwards.
	pub fn replace(&mut self, paragraph: &ParagraphId, mut highlights: Vec<Highlight>) {
		highlights.sort_by_key(|h| (h.start_index, h.id.index()));
		if highlights.is_empty() {
			self.by_paragraph.remove(paragraph);
		} else {
			self.by_paragraph.insert(paragraph.clone(), highlights);
		}
		if self.selected.as_ref().is_some_and(|id| id.paragraph() == paragraph && self.find(id).is_none()) {
			self.selected = None;
		}
	}

	/// Drops every highlight of `paragraph`, deselecting if needed.
	pub fn remove_paragraph(&mut self, paragraph: &ParagraphId) -> Removal {
		let removed = self.by_paragraph.remove(paragraph).map_or(0, |list| list.len());
		let selection_cleared = self.selected.as_ref().is_some_and(|id| id.paragraph() == paragraph);
		if selection_cleared {
			self.selected = None;
		}
		Removal {
			removed,
			selection_cleared,
		}
	}

	/// Regroups `highlights` by paragraph, replacing everything.
	pub fn replace_all(&mut self, highlights: Vec<Highlight>) {
		self.by_paragraph.clear();
		for highlight in highlights {
			self.by_paragraph.entry(highlight.paragraph_id.clone()).or_default().push(highlight);
		}
		for list in self.by_paragraph.values_mut() {
			list.sort_by_key(|h| (h.start_index, h.id.index()));
		}
		if self.selected.as_ref().is_some_and(|id| self.find(id).is_none()) {
			self.selected = None;
		}
	}

	pub fn clear(&mut self) {
		self.by_paragraph.clear();
		self.selected = None;
	}

	/// Selects a highlight by id, or deselects with `None`.
	///
	/// Returns false, leaving the selection alone, when the id is unknown or already selected.
	pub fn select(&mut self, id: Option<HighlightId>) -> bool {
		if id.as_ref().is_some_and(|id| self.find(id).is_none()) || id == self.selected {
			return false;
		}
		self.selected = id;
		true
	}

	pub fn selected(&self) -> Option<&HighlightId> {
		self.selected.as_ref()
	}

	pub fn selected_highlight(&self) -> Option<&Highlight> {
		self.selected.as_ref().and_then(|id| self.find(id))
	}

	pub fn find(&self, id: &HighlightId) -> Option<&Highlight> {
		self.by_paragraph.get(id.paragraph())?.iter().find(|h| &h.id == id)
	}

	/// Highlights of one paragraph in start order.
	pub fn for_paragraph(&self, paragraph: &ParagraphId) -> &[Highlight] {
		self.by_paragraph.get(paragraph).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn count_for(&self, paragraph: &ParagraphId) -> usize {
		self.for_paragraph(paragraph).len()
	}

	pub fn total(&self) -> usize {
		self.by_paragraph.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.by_paragraph.is_empty()
	}

	/// All highlights ordered by paragraph id, then start.
	pub fn all(&self) -> Vec<&Highlight> {
		let mut paragraphs: Vec<&ParagraphId> = self.by_paragraph.keys().collect();
		paragraphs.sort();
		paragraphs.into_iter().flat_map(|p| self.for_paragraph(p)).collect()
	}

	/// All highlights following the given paragraph order.
	pub fn in_order<'a>(&'a self, order: &'a [ParagraphId]) -> impl Iterator<Item = &'a Highlight> + 'a {
		order.iter().flat_map(move |p| self.for_paragraph(p))
	}

	pub fn by_type(&self, issue_type: IssueType) -> Vec<&Highlight> {
		self.all().into_iter().filter(|h| h.issue_type == issue_type).collect()
	}

	pub fn by_priority(&self, priority: Priority) -> Vec<&Highlight> {
		self.all().into_iter().filter(|h| h.priority == priority).collect()
	}
}
