use std::ops::Range;

/// A position in paragraph text, measured in chars (Unicode scalar values), not bytes.
///
/// All span and highlight offsets use this coordinate space.
pub type CharIdx = usize;

/// Returns the length of `text` in chars.
pub fn char_len(text: &str) -> usize {
	text.chars().count()
}

/// Returns true when `text` is empty after trimming whitespace.
pub fn is_blank(text: &str) -> bool {
	text.trim().is_empty()
}

/// Truncates `text` to `max_chars` chars, appending `...` when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((byte, _)) => format!("{}...", &text[..byte]),
		None => text.to_string(),
	}
}

/// Char-boundary table over a string for O(1) char-offset slicing.
///
/// `bounds[i]` is the byte offset of char `i`; the final entry is `text.len()`.
#[derive(Debug, Clone)]
pub struct CharIndex<'a> {
	text: &'a str,
	bounds: Vec<usize>,
}

impl<'a> CharIndex<'a> {
	pub fn new(text: &'a str) -> Self {
		let mut bounds: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
		bounds.push(text.len());
		Self { text, bounds }
	}

	pub fn text(&self) -> &'a str {
		self.text
	}

	/// Number of chars in the indexed text.
	pub fn len_chars(&self) -> usize {
		self.bounds.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}

	/// Converts a char range into a byte range, or `None` when out of bounds or inverted.
	pub fn byte_range(&self, start: CharIdx, end: CharIdx) -> Option<Range<usize>> {
		if start > end || end > self.len_chars() {
			return None;
		}
		Some(self.bounds[start]..self.bounds[end])
	}

	/// Slices the text by char offsets, or `None` when out of bounds or inverted.
	pub fn slice(&self, start: CharIdx, end: CharIdx) -> Option<&'a str> {
		self.byte_range(start, end).map(|range| &self.text[range])
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn slices_by_chars_not_bytes() {
		let idx = CharIndex::new("naïve café");
		assert_eq!(idx.len_chars(), 10);
		assert_eq!(idx.slice(0, 5), Some("naïve"));
		assert_eq!(idx.slice(6, 10), Some("café"));
		assert_eq!(idx.slice(6, 11), None);
		assert_eq!(idx.slice(4, 3), None);
	}

	#[test]
	fn empty_text_has_single_bound() {
		let idx = CharIndex::new("");
		assert_eq!(idx.len_chars(), 0);
		assert!(idx.is_empty());
		assert_eq!(idx.slice(0, 0), Some(""));
	}

	#[test]
	fn preview_truncates_with_ellipsis() {
		assert_eq!(preview("short", 30), "short");
		assert_eq!(preview("abcdef", 3), "abc...");
		assert_eq!(preview("ééééé", 2), "éé...");
		assert_eq!(preview("abc", 3), "abc");
	}

	#[test]
	fn blank_detection_trims_whitespace() {
		assert!(is_blank(""));
		assert!(is_blank(" \n\t "));
		assert!(!is_blank(" a "));
	}

	proptest! {
		#[test]
		fn slice_matches_char_iteration(text in "\\PC{0,40}", a in 0usize..45, b in 0usize..45) {
			let idx = CharIndex::new(&text);
			let chars: Vec<char> = text.chars().collect();
			let expected = (a <= b && b <= chars.len()).then(|| chars[a..b].iter().collect::<String>());
			prop_assert_eq!(idx.slice(a, b).map(str::to_string), expected);
		}
	}
}
