use serde::Deserialize;
use serde_json::Value;

/// One span object exactly as the service produced it.
///
/// Every field is optional and offsets/confidence stay untyped so a single malformed
/// field rejects only this span (during validation), never the whole response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSpan {
	pub text: Option<String>,
	pub start_offset: Option<Value>,
	pub end_offset: Option<Value>,
	#[serde(rename = "type")]
	pub issue_type: Option<String>,
	pub priority: Option<String>,
	pub confidence: Option<Value>,
	pub reasoning: Option<String>,
}

impl RawSpan {
	/// Decodes one JSON object, or `None` if it is not an object or a string field has the wrong type.
	pub fn from_value(value: Value) -> Option<Self> {
		if !value.is_object() {
			return None;
		}
		serde_json::from_value(value).ok()
	}

	/// Whether the span carries non-empty text and both offsets.
	pub fn has_required_fields(&self) -> bool {
		self.text.as_deref().is_some_and(|t| !t.is_empty()) && self.start_offset.is_some() && self.end_offset.is_some()
	}
}

/// Reads an offset as an integer. Accepts integral floats (`12.0`), rejects strings.
pub(crate) fn integral(value: &Value) -> Option<i64> {
	if let Some(n) = value.as_i64() {
		return Some(n);
	}
	let f = value.as_f64()?;
	(f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}
