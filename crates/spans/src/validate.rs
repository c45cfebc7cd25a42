use std::fmt;

use drafter_primitives::{CharIdx, CharIndex, Highlight, HighlightId, IssueType, ParagraphId, Priority, preview};

use crate::raw::{RawSpan, integral};


/// Default half-width of the fuzzy offset search, in chars.
pub const DEFAULT_CORRECTION_WINDOW: usize = 5;
/// Windows wider than this are clamped.
pub const MAX_CORRECTION_WINDOW: usize = 64;

/// Why a raw span was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
	MissingText,
	MissingOffsets,
	NonNumericOffset,
	EmptyRange,
	OutOfBounds,
	NoMatch,
	UnknownType,
	UnknownPriority,
	InvalidConfidence,
}

impl Rejection {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingText => "missing_text",
			Self::MissingOffsets => "missing_offsets",
			Self::NonNumericOffset => "non_numeric_offset",
			Self::EmptyRange => "empty_range",
			Self::OutOfBounds => "out_of_bounds",
			Self::NoMatch => "no_match",
			Self::UnknownType => "unknown_type",
			Self::UnknownPriority => "unknown_priority",
			Self::InvalidConfidence => "invalid_confidence",
		}
	}
}

impl fmt::Display for Rejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A span whose offsets are guaranteed to address `text` in the content it was
/// validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSpan {
	pub text: String,
	pub start: CharIdx,
	pub end: CharIdx,
	pub issue_type: IssueType,
	pub priority: Priority,
	pub confidence: f32,
	pub reasoning: String,
	/// Offsets were rewritten by the fuzzy search.
	pub corrected: bool,
}

/// Checks raw spans against authoritative paragraph text and repairs small offset drift.
///
/// Offsets are accepted as-is when the addressed substring equals the span text.
/// Otherwise every `(start + i, end + j)` with `i, j` in `[-window, window]` is tried,
/// outer loop over `i`, and the first exact match wins. Offsets that overshoot the
/// content by no more than `window` count as drift rather than garbage.
#[derive(Debug, Clone, Copy)]
pub struct SpanCorrector {
	window: usize,
}

impl Default for SpanCorrector {
	fn default() -> Self {
		Self::new(DEFAULT_CORRECTION_WINDOW)
	}
}

impl SpanCorrector {
	/// Creates a corrector searching `window` chars either side, at most [`MAX_CORRECTION_WINDOW`].
	pub fn new(window: usize) -> Self {
		Self {
			window: window.min(MAX_CORRECTION_WINDOW),
		}
	}

	pub const fn window(&self) -> usize {
		self.window
	}

	fn signed_window(&self) -> i64 {
		i64::try_from(self.window).unwrap_or(MAX_CORRECTION_WINDOW as i64)
	}

	/// Validates every span against `content`, dropping the ones that fail.
	pub fn validate(&self, content: &str, spans: &[RawSpan]) -> Vec<ValidSpan> {
		let index = CharIndex::new(content);
		let mut valid = Vec::with_capacity(spans.len());
		for (position, raw) in spans.iter().enumerate() {
			match self.check(&index, raw) {
				Ok(span) => {
					if span.corrected {
						tracing::trace!(position, start = span.start, end = span.end, "spans.corrected");
					}
					valid.push(span);
				}
				Err(reason) => {
					tracing::debug!(position, %reason, text = raw.text.as_deref().unwrap_or_default(), "spans.reject");
				}
			}
		}
		valid
	}

	/// Runs the validation steps for one span.
	pub fn check(&self, index: &CharIndex<'_>, raw: &RawSpan) -> Result<ValidSpan, Rejection> {
		let text = raw.text.as_deref().filter(|t| !t.is_empty()).ok_or(Rejection::MissingText)?;
		let (Some(start), Some(end)) = (raw.start_offset.as_ref(), raw.end_offset.as_ref()) else {
			return Err(Rejection::MissingOffsets);
		};
		let start = integral(start).ok_or(Rejection::NonNumericOffset)?;
		let end = integral(end).ok_or(Rejection::NonNumericOffset)?;

		let len = index.len_chars() as i64;
		let window = self.signed_window();
		if start >= end {
			return Err(Rejection::EmptyRange);
		}
		if start < -window || end > len + window {
			return Err(Rejection::OutOfBounds);
		}

		let (start, end, corrected) = match exact(index, start, end, text) {
			Some((s, e)) => (s, e, false),
			None => {
				let (s, e) = self.search(index, start, end, text).ok_or(Rejection::NoMatch)?;
				(s, e, true)
			}
		};

		let issue_type = raw
			.issue_type
			.as_deref()
			.and_then(|t| t.parse::<IssueType>().ok())
			.ok_or(Rejection::UnknownType)?;
		let priority = raw
			.priority
			.as_deref()
			.and_then(|p| p.parse::<Priority>().ok())
			.ok_or(Rejection::UnknownPriority)?;
		let confidence = raw
			.confidence
			.as_ref()
			.and_then(|c| c.as_f64())
			.filter(|c| (0.0..=1.0).contains(c))
			.ok_or(Rejection::InvalidConfidence)?;

		Ok(ValidSpan {
			text: text.to_string(),
			start,
			end,
			issue_type,
			priority,
			confidence: confidence as f32,
			reasoning: raw.reasoning.clone().unwrap_or_default(),
			corrected,
		})
	}

	fn search(&self, index: &CharIndex<'_>, start: i64, end: i64, text: &str) -> Option<(CharIdx, CharIdx)> {
		let window = self.signed_window();
		let len = index.len_chars() as i64;
		for i in -window..=window {
			let s = (start + i).clamp(0, len);
			for j in -window..=window {
				let e = (end + j).clamp(0, len);
				if s < e && index.slice(s as usize, e as usize) == Some(text) {
					return Some((s as usize, e as usize));
				}
			}
		}
		None
	}
}

fn exact(index: &CharIndex<'_>, start: i64, end: i64, text: &str) -> Option<(CharIdx, CharIdx)> {
	let start = usize::try_from(start).ok()?;
	let end = usize::try_from(end).ok()?;
	(index.slice(start, end)? == text).then_some((start, end))
}

/// Builds highlights for `paragraph`, numbering them by position in `spans`.
pub fn into_highlights(paragraph: &ParagraphId, spans: Vec<ValidSpan>, preview_chars: usize) -> Vec<Highlight> {
	spans
		.into_iter()
		.enumerate()
		.map(|(index, span)| Highlight {
			id: HighlightId::new(paragraph.clone(), index as u32),
			paragraph_id: paragraph.clone(),
			issue_type: span.issue_type,
			priority: span.priority,
			start_index: span.start,
			end_index: span.end,
			text: preview(&span.text, preview_chars),
			full_text: span.text,
			note: span.reasoning,
			confidence: span.confidence,
		})
		.collect()
}
