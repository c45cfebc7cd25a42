use serde_json::Value;

use crate::partial::parse_partial_spans;
use crate::raw::RawSpan;

/// Decodes the spans in a complete (or truncated) service response.
///
/// The first balanced top-level object is extracted, stripped of control characters
/// and parsed; a second attempt normalises typographic quotes. If neither yields a
/// `spans` array the partial parser scans the raw text for whichever span objects
/// are complete. Unparseable output yields an empty set, never an error.
pub fn parse_spans(output: &str) -> Vec<RawSpan> {
	if let Some(object) = extract_json_object(output) {
		let cleaned = strip_control(object);
		for candidate in [cleaned.clone(), normalize_quotes(&cleaned)] {
			if let Ok(document) = serde_json::from_str::<Value>(&candidate)
				&& let Some(spans) = spans_from_document(document)
			{
				return spans;
			}
		}
		tracing::debug!(len = output.len(), "spans.parse.fallback_partial");
	}
	parse_partial_spans(output)
}

/// Returns the first balanced `{...}` object in `text`, ignoring braces inside strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let mut depth = 0usize;
	let mut in_string = false;
	let mut escaped = false;

	for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
		if escaped {
			escaped = false;
			continue;
		}
		if in_string {
			match byte {
				b'\\' => escaped = true,
				b'"' => in_string = false,
				_ => {}
			}
			continue;
		}
		match byte {
			b'"' => in_string = true,
			b'{' => depth += 1,
			b'}' => {
				depth -= 1;
				if depth == 0 {
					return Some(&text[start..=start + offset]);
				}
			}
			_ => {}
		}
	}
	None
}

fn spans_from_document(document: Value) -> Option<Vec<RawSpan>> {
	let Value::Object(mut map) = document else {
		return None;
	};
	let Value::Array(items) = map.remove("spans")? else {
		return None;
	};
	Some(items.into_iter().filter_map(RawSpan::from_value).collect())
}

pub(crate) fn strip_control(text: &str) -> String {
	text.chars().filter(|c| !c.is_control()).collect()
}

fn normalize_quotes(text: &str) -> String {
	text.replace(['\u{201C}', '\u{201D}'], "\"").replace(['\u{2018}', '\u{2019}'], "'")
}
