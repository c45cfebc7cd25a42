//! Plain-text documents: paragraph splitting and marker rendering.

use std::fmt::Write;

use drafter_primitives::{Highlight, Paragraph};
use drafter_spans::{Segment, render_segments};
use serde::Serialize;

/// Splits `text` on blank lines into paragraphs `p1..pn`.
///
/// Lines inside a paragraph keep their line breaks; leading and trailing blank lines vanish.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
	let mut paragraphs = Vec::new();
	let mut current: Vec<&str> = Vec::new();
	for line in text.lines() {
		if line.trim().is_empty() {
			flush(&mut paragraphs, &mut current);
		} else {
			current.push(line);
		}
	}
	flush(&mut paragraphs, &mut current);
	paragraphs
}

fn flush(paragraphs: &mut Vec<Paragraph>, lines: &mut Vec<&str>) {
	if lines.is_empty() {
		return;
	}
	let id = format!("p{}", paragraphs.len() + 1);
	paragraphs.push(Paragraph::new(id, lines.join("\n")));
	lines.clear();
}

/// Renders one paragraph with `[[type/priority: text]]` markers, followed by the notes.
pub fn render_paragraph(out: &mut String, paragraph: &Paragraph, highlights: &[&Highlight]) {
	for segment in render_segments(&paragraph.content, highlights.iter().copied()) {
		match segment {
			Segment::Plain(text) => out.push_str(text),
			Segment::Marked { highlight, text } => {
				let _ = write!(out, "[[{}/{}: {}]]", highlight.issue_type, highlight.priority, text);
			}
		}
	}
	out.push('\n');
	for highlight in highlights {
		let _ = write!(
			out,
			"  - {} {}/{} ({:.2}) \"{}\"",
			highlight.id, highlight.issue_type, highlight.priority, highlight.confidence, highlight.text
		);
		if !highlight.note.is_empty() {
			let _ = write!(out, ": {}", highlight.note);
		}
		out.push('\n');
	}
}

/// Renders every paragraph in order, separated by blank lines.
pub fn render_document(paragraphs: &[Paragraph], highlights: &[Highlight]) -> String {
	let mut out = String::new();
	for (i, paragraph) in paragraphs.iter().enumerate() {
		if i > 0 {
			out.push('\n');
		}
		let own: Vec<&Highlight> = highlights.iter().filter(|h| h.paragraph_id == paragraph.id).collect();
		render_paragraph(&mut out, paragraph, &own);
	}
	out
}

/// A failed analysis in the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
	pub paragraph: String,
	pub kind: &'static str,
	pub message: String,
}

/// `drafter analyze --json` output.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
	pub paragraphs: &'a [Paragraph],
	pub highlights: &'a [Highlight],
	pub failures: &'a [FailureReport],
}
