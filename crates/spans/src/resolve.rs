use drafter_primitives::{CharIndex, Highlight};

/// Picks a non-overlapping, start-ordered subset of one paragraph's highlights.
///
/// Highlights addressing empty or out-of-range text in `content` are discarded
/// first. Candidates are visited by `(start_index, id index)`; when a candidate
/// overlaps the accepted set it replaces the accepted highlight only if strictly
/// longer, so equal-length overlaps keep the earlier start, then the lower index.
pub fn resolve_overlaps<'h>(content: &str, highlights: impl IntoIterator<Item = &'h Highlight>) -> Vec<&'h Highlight> {
	let index = CharIndex::new(content);
	let mut candidates: Vec<&Highlight> = highlights
		.into_iter()
		.filter(|h| index.slice(h.start_index, h.end_index).is_some_and(|text| !text.is_empty()))
		.collect();
	candidates.sort_by_key(|h| (h.start_index, h.id.index()));

	let mut accepted: Vec<&Highlight> = Vec::with_capacity(candidates.len());
	for candidate in candidates {
		// Accepted entries are disjoint and start no later than the candidate, so
		// only the last one can reach past the candidate's start.
		let overlapping = accepted.last().is_some_and(|last| last.overlaps(candidate));
		if !overlapping {
			accepted.push(candidate);
		} else if let Some(last) = accepted.last_mut()
			&& candidate.len() > last.len()
		{
			*last = candidate;
		}
	}
	accepted
}

/// A run of paragraph text, either literal or covered by a highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'a> {
	Plain(&'a str),
	Marked { highlight: &'a Highlight, text: &'a str },
}

impl<'a> Segment<'a> {
	pub fn text(&self) -> &'a str {
		match self {
			Self::Plain(text) | Self::Marked { text, .. } => text,
		}
	}
}

/// Splits `content` into literal and highlighted segments after resolving overlaps.
///
/// Concatenating the segment texts reproduces `content` exactly.
pub fn render_segments<'a>(content: &'a str, highlights: impl IntoIterator<Item = &'a Highlight>) -> Vec<Segment<'a>> {
	let index = CharIndex::new(content);
	let mut segments = Vec::new();
	let mut cursor = 0;
	for highlight in resolve_overlaps(content, highlights) {
		let Some(range) = index.byte_range(highlight.start_index, highlight.end_index) else {
			continue;
		};
		if range.start > cursor {
			segments.push(Segment::Plain(&content[cursor..range.start]));
		}
		segments.push(Segment::Marked {
			highlight,
			text: &content[range.clone()],
		});
		cursor = range.end;
	}
	if cursor < content.len() {
		segments.push(Segment::Plain(&content[cursor..]));
	}
	segments
}

#[cfg(test)]
mod tests {
	use drafter_primitives::{HighlightId, IssueType, Priority};
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	const CONTENT: &str = "The quick brown fox jumps over the lazy dog.";

	fn highlight(index: u32, start: usize, end: usize) -> Highlight {
		Highlight {
			id: HighlightId::new("p1".into(), index),
			paragraph_id: "p1".into(),
			issue_type: IssueType::Clarity,
			priority: Priority::Medium,
			start_index: start,
			end_index: end,
			text: String::new(),
			full_text: String::new(),
			note: String::new(),
			confidence: 0.5,
		}
	}

	fn ranges(resolved: &[&Highlight]) -> Vec<(usize, usize)> {
		resolved.iter().map(|h| (h.start_index, h.end_index)).collect()
	}

	#[test]
	fn longer_overlapping_highlight_wins() {
		let highlights = [highlight(0, 0, 10), highlight(1, 5, 20)];
		assert_eq!(ranges(&resolve_overlaps(CONTENT, &highlights)), [(5, 20)]);
	}

	#[test]
	fn adjacent_highlights_both_survive_in_order() {
		let highlights = [highlight(0, 5, 10), highlight(1, 0, 5)];
		assert_eq!(ranges(&resolve_overlaps(CONTENT, &highlights)), [(0, 5), (5, 10)]);
	}

	#[test]
	fn equal_length_overlap_keeps_earlier_start() {
		let highlights = [highlight(0, 4, 10), highlight(1, 2, 8)];
		assert_eq!(ranges(&resolve_overlaps(CONTENT, &highlights)), [(2, 8)]);
	}

	#[test]
	fn equal_range_keeps_lower_index() {
		let highlights = [highlight(3, 4, 10), highlight(1, 4, 10)];
		let resolved = resolve_overlaps(CONTENT, &highlights);
		assert_eq!(resolved.len(), 1);
		assert_eq!(resolved[0].id.index(), 1);
	}

	#[test]
	fn shorter_contained_highlight_is_dropped() {
		let highlights = [highlight(0, 0, 20), highlight(1, 4, 9), highlight(2, 25, 30)];
		assert_eq!(ranges(&resolve_overlaps(CONTENT, &highlights)), [(0, 20), (25, 30)]);
	}

	#[test]
	fn out_of_range_and_empty_highlights_are_discarded() {
		let highlights = [highlight(0, 40, 60), highlight(1, 7, 7), highlight(2, 4, 9)];
		assert_eq!(ranges(&resolve_overlaps(CONTENT, &highlights)), [(4, 9)]);
	}

	#[test]
	fn segments_reassemble_content() {
		let highlights = [highlight(0, 4, 9), highlight(1, 16, 19)];
		let segments = render_segments(CONTENT, &highlights);
		let texts: Vec<&str> = segments.iter().map(Segment::text).collect();
		assert_eq!(texts, ["The ", "quick", " brown ", "fox", " jumps over the lazy dog."]);
		assert!(matches!(segments[1], Segment::Marked { highlight, .. } if highlight.id.index() == 0));
		assert!(matches!(segments[0], Segment::Plain(_)));
	}

	#[test]
	fn segments_slice_multibyte_text_by_chars() {
		let content = "é café ñ";
		let highlights = [highlight(0, 2, 6)];
		let texts: Vec<&str> = render_segments(content, &highlights).iter().map(Segment::text).collect();
		assert_eq!(texts, ["é ", "café", " ñ"]);
	}

	#[test]
	fn no_highlights_is_one_plain_segment() {
		assert_eq!(render_segments(CONTENT, []), [Segment::Plain(CONTENT)]);
		assert!(render_segments("", []).is_empty());
	}

	proptest! {
		#[test]
		fn resolved_highlights_are_disjoint_and_sorted(
			spans in prop::collection::vec((0usize..50, 1usize..15), 0..12)
		) {
			let highlights: Vec<Highlight> = spans
				.iter()
				.enumerate()
				.map(|(i, &(start, len))| highlight(i as u32, start, start + len))
				.collect();
			let resolved = resolve_overlaps(CONTENT, &highlights);
			for pair in resolved.windows(2) {
				prop_assert!(pair[0].end_index <= pair[1].start_index);
			}
			for h in &resolved {
				prop_assert!(h.end_index <= CONTENT.len());
			}
			let rendered: String = render_segments(CONTENT, &highlights).iter().map(Segment::text).collect();
			prop_assert_eq!(rendered, CONTENT);
		}
	}
}
