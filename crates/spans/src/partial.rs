use serde_json::Value;

use crate::parse::strip_control;
use crate::raw::RawSpan;

/// Incremental scanner that extracts complete span objects from a `"spans": [...]`
/// array while the surrounding document is still arriving.
///
/// Feed text with [`push`](Self::push); every balanced `{...}` inside the array is
/// decoded as soon as its closing brace arrives. Incomplete trailing fragments are
/// never decoded.
#[derive(Debug, Default)]
pub struct PartialSpanParser {
	buffer: String,
	state: ScanState,
	spans: Vec<RawSpan>,
}

#[derive(Debug, Default, Clone, Copy)]
enum ScanState {
	#[default]
	SeekingArray,
	InArray(ArrayScan),
	Done,
}

#[derive(Debug, Clone, Copy)]
struct ArrayScan {
	pos: usize,
	depth: usize,
	in_string: bool,
	escaped: bool,
	object_start: Option<usize>,
}

impl PartialSpanParser {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends streamed text and returns how many new spans became complete.
	pub fn push(&mut self, chunk: &str) -> usize {
		let before = self.spans.len();
		self.buffer.push_str(chunk);
		self.scan();
		self.spans.len() - before
	}

	/// Spans decoded so far, in array order.
	pub fn spans(&self) -> &[RawSpan] {
		&self.spans
	}

	pub fn into_spans(self) -> Vec<RawSpan> {
		self.spans
	}

	/// Whether the closing `]` of the spans array has been seen.
	pub fn is_complete(&self) -> bool {
		matches!(self.state, ScanState::Done)
	}

	fn scan(&mut self) {
		if let ScanState::SeekingArray = self.state {
			match find_array_start(&self.buffer) {
				Some(pos) => {
					self.state = ScanState::InArray(ArrayScan {
						pos,
						depth: 0,
						in_string: false,
						escaped: false,
						object_start: None,
					});
				}
				None => return,
			}
		}

		let ScanState::InArray(mut scan) = self.state else {
			return;
		};

		let bytes = self.buffer.as_bytes();
		while scan.pos < bytes.len() {
			let byte = bytes[scan.pos];
			if scan.escaped {
				scan.escaped = false;
			} else if scan.in_string {
				match byte {
					b'\\' => scan.escaped = true,
					b'"' => scan.in_string = false,
					_ => {}
				}
			} else {
				match byte {
					b'"' => scan.in_string = true,
					b'{' => {
						if scan.depth == 0 {
							scan.object_start = Some(scan.pos);
						}
						scan.depth += 1;
					}
					b'}' if scan.depth > 0 => {
						scan.depth -= 1;
						if scan.depth == 0
							&& let Some(start) = scan.object_start.take()
							&& let Some(span) = decode_object(&self.buffer[start..=scan.pos])
						{
							self.spans.push(span);
						}
					}
					b']' if scan.depth == 0 => {
						self.state = ScanState::Done;
						return;
					}
					_ => {}
				}
			}
			scan.pos += 1;
		}
		self.state = ScanState::InArray(scan);
	}
}

/// Extracts whichever complete span objects `text` contains.
pub fn parse_partial_spans(text: &str) -> Vec<RawSpan> {
	let mut parser = PartialSpanParser::new();
	parser.push(text);
	parser.into_spans()
}

/// Byte offset just past the `[` of `"spans" : [`, if the buffer contains it.
fn find_array_start(buffer: &str) -> Option<usize> {
	buffer.match_indices("\"spans\"").find_map(|(idx, key)| {
		let after_key = idx + key.len();
		let rest = buffer[after_key..].trim_start();
		let rest = rest.strip_prefix(':')?.trim_start();
		rest.strip_prefix('[')?;
		Some(buffer.len() - rest.len() + 1)
	})
}

fn decode_object(object: &str) -> Option<RawSpan> {
	let value = serde_json::from_str::<Value>(object)
		.or_else(|_| serde_json::from_str::<Value>(&strip_control(object)))
		.ok()?;
	RawSpan::from_value(value).filter(RawSpan::has_required_fields)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn texts(spans: &[RawSpan]) -> Vec<&str> {
		spans.iter().filter_map(|s| s.text.as_deref()).collect()
	}

	#[test]
	fn emits_spans_as_objects_close() {
		let mut parser = PartialSpanParser::new();
		assert_eq!(parser.push(r#"{"spa"#), 0);
		assert_eq!(parser.push(r#"ns": [ {"text": "one", "startOffset": 0,"#), 0);
		assert_eq!(parser.push(r#" "endOffset": 3}, {"text": "tw"#), 1);
		assert_eq!(parser.push(r#"o", "startOffset": 4, "endOffset": 7}"#), 1);
		assert!(!parser.is_complete());
		assert_eq!(parser.push("]}"), 0);
		assert!(parser.is_complete());
		assert_eq!(texts(parser.spans()), ["one", "two"]);
	}

	#[test]
	fn ignores_braces_and_brackets_inside_strings() {
		let text = r#"{"spans":[{"text":"a } ] {","startOffset":0,"endOffset":7,"reasoning":"say \"hi\" ]"}]}"#;
		assert_eq!(texts(&parse_partial_spans(text)), ["a } ] {"]);
	}

	#[test]
	fn skips_objects_missing_required_fields() {
		let text = r#"{"spans":[{"text":"a"},{"startOffset":0,"endOffset":1},{"text":"b","startOffset":1,"endOffset":2}]}"#;
		assert_eq!(texts(&parse_partial_spans(text)), ["b"]);
	}

	#[test]
	fn stops_at_array_end() {
		let text = r#"{"spans":[{"text":"a","startOffset":0,"endOffset":1}], "extra": [{"text":"b","startOffset":1,"endOffset":2}]}"#;
		assert_eq!(texts(&parse_partial_spans(text)), ["a"]);
	}

	#[test]
	fn no_spans_key_yields_nothing() {
		assert!(parse_partial_spans(r#"{"text":"a","startOffset":0,"endOffset":1}"#).is_empty());
		assert!(parse_partial_spans(r#"{"spans": {"text":"a"}}"#).is_empty());
	}

	#[test]
	fn nested_objects_decode_as_one_span() {
		let text = r#"{"spans":[{"text":"a","startOffset":0,"endOffset":1,"meta":{"k":1}}"#;
		assert_eq!(texts(&parse_partial_spans(text)), ["a"]);
	}
}
