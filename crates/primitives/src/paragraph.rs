use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Stable identity of a paragraph.
///
/// Identity survives edits: content is replaced wholesale while the id stays the
/// same. Cloning is cheap (shared string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParagraphId(Arc<str>);

impl ParagraphId {
	pub fn new(id: impl AsRef<str>) -> Self {
		Self(Arc::from(id.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ParagraphId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for ParagraphId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ParagraphId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for ParagraphId {
	fn from(value: String) -> Self {
		Self(Arc::from(value))
	}
}

impl Serialize for ParagraphId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

/// A paragraph as owned by the editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
	pub id: ParagraphId,
	pub content: String,
}

impl Paragraph {
	pub fn new(id: impl Into<ParagraphId>, content: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			content: content.into(),
		}
	}

	/// Returns true when the content is empty after trimming whitespace.
	pub fn is_blank(&self) -> bool {
		crate::is_blank(&self.content)
	}
}
