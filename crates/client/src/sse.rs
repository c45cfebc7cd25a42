use serde_json::Value;

/// One meaningful event from a Messages API stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
	/// Text appended to the response.
	Delta(String),
	/// `message_stop` or `[DONE]`.
	Stop,
	/// In-stream error event.
	Error(String),
}

/// Reassembles `data:` lines from arbitrarily split network chunks.
///
/// Non-data lines, unknown event types, and malformed JSON are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
	buffer: Vec<u8>,
}

impl SseDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Consumes a chunk and returns the events of every line it completed.
	pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
		self.buffer.extend_from_slice(chunk);
		let mut events = Vec::new();
		while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
			let line: Vec<u8> = self.buffer.drain(..=newline).collect();
			if let Some(event) = decode_line(&line) {
				events.push(event);
			}
		}
		events
	}

	/// Decodes a trailing line that was never newline-terminated.
	pub fn finish(&mut self) -> Option<StreamEvent> {
		let line = std::mem::take(&mut self.buffer);
		decode_line(&line)
	}
}

fn decode_line(line: &[u8]) -> Option<StreamEvent> {
	let line = String::from_utf8_lossy(line);
	let line = line.trim_end_matches(['\n', '\r']);
	let data = line.strip_prefix("data:")?;
	let data = data.strip_prefix(' ').unwrap_or(data);
	if data == "[DONE]" {
		return Some(StreamEvent::Stop);
	}

	let Ok(event) = serde_json::from_str::<Value>(data) else {
		tracing::trace!(len = data.len(), "client.stream.malformed");
		return None;
	};
	match event.get("type").and_then(Value::as_str)? {
		"content_block_delta" => {
			let text = event.pointer("/delta/text").and_then(Value::as_str)?;
			(!text.is_empty()).then(|| StreamEvent::Delta(text.to_string()))
		}
		"message_stop" => Some(StreamEvent::Stop),
		"error" => {
			let message = event
				.pointer("/error/message")
				.and_then(Value::as_str)
				.unwrap_or("unknown stream error");
			Some(StreamEvent::Error(message.to_string()))
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	const DELTA: &str = r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"{\"spans\""}}"#;

	#[test]
	fn decodes_text_deltas_and_skips_other_events() {
		let stream = format!(
			"event: message_start\ndata: {{\"type\":\"message_start\"}}\n\nevent: content_block_delta\n{DELTA}\n\ndata: {{\"type\":\"ping\"}}\n"
		);
		let events = SseDecoder::new().push(stream.as_bytes());
		assert_eq!(events, [StreamEvent::Delta("{\"spans\"".into())]);
	}

	#[test]
	fn reassembles_lines_split_across_chunks() {
		let line = format!("{DELTA}\r\n");
		let (a, b) = line.as_bytes().split_at(25);
		let mut decoder = SseDecoder::new();
		assert!(decoder.push(a).is_empty());
		assert_eq!(decoder.push(b), [StreamEvent::Delta("{\"spans\"".into())]);
	}

	#[test]
	fn reassembles_multibyte_text_split_mid_char() {
		let line = "data: {\"type\":\"content_block_delta\",\"delta\":{\"text\":\"caf\u{e9}\"}}\n";
		let split = line.find('\u{e9}').unwrap() + 1;
		let mut decoder = SseDecoder::new();
		assert!(decoder.push(&line.as_bytes()[..split]).is_empty());
		assert_eq!(decoder.push(&line.as_bytes()[split..]), [StreamEvent::Delta("caf\u{e9}".into())]);
	}

	#[test]
	fn recognises_stream_end_and_errors() {
		let mut decoder = SseDecoder::new();
		let events = decoder.push(
			b"data: [DONE]\ndata: {\"type\":\"message_stop\"}\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n",
		);
		assert_eq!(events, [StreamEvent::Stop, StreamEvent::Stop, StreamEvent::Error("Overloaded".into())]);
	}

	#[test]
	fn malformed_lines_are_skipped() {
		let mut decoder = SseDecoder::new();
		assert!(decoder.push(b"data: {not json\ndata:\n: comment\n").is_empty());
	}

	#[test]
	fn finish_flushes_unterminated_line() {
		let mut decoder = SseDecoder::new();
		assert!(decoder.push(b"data: [DO").is_empty());
		assert!(decoder.push(b"NE]").is_empty());
		assert_eq!(decoder.finish(), Some(StreamEvent::Stop));
		assert_eq!(decoder.finish(), None);
	}
}
