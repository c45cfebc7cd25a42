use drafter_client::DocumentContext;
use drafter_primitives::{Paragraph, ParagraphId, is_blank};
use rustc_hash::FxHashMap;

/// Effect of writing a paragraph's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChange {
	Unchanged,
	Changed,
	Inserted,
}

/// The pipeline's mirror of the document: paragraph order plus current content.
///
/// Content is replaced wholesale; ids are stable across edits.
#[derive(Debug, Default, Clone)]
pub struct ParagraphStore {
	order: Vec<ParagraphId>,
	contents: FxHashMap<ParagraphId, String>,
}

impl ParagraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a paragraph's content, appending unknown ids at the end.
	pub fn set(&mut self, id: &ParagraphId, content: &str) -> ContentChange {
		match self.contents.get_mut(id) {
			Some(current) if current == content => ContentChange::Unchanged,
			Some(current) => {
				content.clone_into(current);
				ContentChange::Changed
			}
			None => {
				self.order.push(id.clone());
				self.contents.insert(id.clone(), content.to_string());
				ContentChange::Inserted
			}
		}
	}

	/// Inserts `paragraph` directly after `after`, or at the end when `after` is unknown.
	///
	/// An existing paragraph with the same id is moved and overwritten.
	pub fn insert_after(&mut self, after: &ParagraphId, paragraph: Paragraph) -> ContentChange {
		let change = match self.contents.insert(paragraph.id.clone(), paragraph.content.clone()) {
			Some(previous) if previous == paragraph.content => ContentChange::Unchanged,
			Some(_) => ContentChange::Changed,
			None => ContentChange::Inserted,
		};
		self.order.retain(|id| id != &paragraph.id);
		let at = self.position(after).map_or(self.order.len(), |pos| pos + 1);
		self.order.insert(at, paragraph.id);
		change
	}

	pub fn remove(&mut self, id: &ParagraphId) -> Option<String> {
		let removed = self.contents.remove(id)?;
		self.order.retain(|other| other != id);
		Some(removed)
	}

	/// Reorders to match `ids`; ids not in the store are ignored, unmentioned ones keep their relative order at the end.
	pub fn reorder(&mut self, ids: &[ParagraphId]) {
		let mut order: Vec<ParagraphId> = Vec::with_capacity(self.order.len());
		for id in ids.iter().chain(&self.order) {
			if self.contents.contains_key(id) && !order.contains(id) {
				order.push(id.clone());
			}
		}
		self.order = order;
	}

	pub fn content(&self, id: &ParagraphId) -> Option<&str> {
		self.contents.get(id).map(String::as_str)
	}

	pub fn contains(&self, id: &ParagraphId) -> bool {
		self.contents.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Paragraph ids in document order.
	pub fn ids(&self) -> &[ParagraphId] {
		&self.order
	}

	/// Owned paragraphs in document order.
	pub fn paragraphs(&self) -> Vec<Paragraph> {
		self.order
			.iter()
			.filter_map(|id| Some(Paragraph::new(id.clone(), self.contents.get(id)?.clone())))
			.collect()
	}

	/// Non-blank paragraphs with `target` marked, as sent alongside an analysis.
	pub fn context(&self, target: &ParagraphId) -> DocumentContext {
		DocumentContext {
			paragraphs: self.paragraphs().into_iter().filter(|p| !is_blank(&p.content)).collect(),
			target: target.clone(),
		}
	}

	fn position(&self, id: &ParagraphId) -> Option<usize> {
		self.order.iter().position(|other| other == id)
	}
}
