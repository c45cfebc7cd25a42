use drafter_primitives::{IssueType, Priority};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{AnthropicClient, ClientError, Endpoint, Result, prompt};

/// Second-stage request for a fuller explanation of one highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainRequest {
	/// Paragraph the span belongs to.
	pub context: String,
	pub span: String,
	pub issue_type: IssueType,
	/// Reasoning from the triage pass.
	pub reasoning: String,
}

/// A concrete rewrite of the span.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Suggestion {
	pub text: String,
	#[serde(default)]
	pub rationale: String,
}

/// Detailed feedback for one span.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetailedFeedback {
	pub explanation: String,
	#[serde(default)]
	pub suggestions: Vec<Suggestion>,
	#[serde(default)]
	pub principle: String,
	pub severity: Priority,
}

impl DetailedFeedback {
	/// Decodes the first JSON object in `text`.
	pub fn from_text(text: &str) -> Result<Self> {
		let object = drafter_spans::extract_json_object(text).ok_or_else(|| ClientError::Decode("no JSON object in response".into()))?;
		serde_json::from_str(object).map_err(|e| ClientError::Decode(e.to_string()))
	}
}

impl AnthropicClient {
	/// Asks for a detailed explanation of one span.
	pub async fn explain_span(
		&self,
		endpoint: &Endpoint,
		model: &str,
		request: &ExplainRequest,
		cancel: CancellationToken,
	) -> Result<DetailedFeedback> {
		let prompt = prompt::span_analysis(&request.context, &request.span, request.issue_type, &request.reasoning);
		let text = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(ClientError::Cancelled),
			text = self.complete(endpoint, model, 1024, prompt) => text?,
		};
		DetailedFeedback::from_text(&text)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn decodes_feedback_wrapped_in_prose() {
		let text = r#"Here you go:
{
  "explanation": "The claim is asserted without support.",
  "suggestions": [
    { "text": "Many owners find cats easier to care for.", "rationale": "Scopes the claim." }
  ],
  "principle": "Support comparative claims.",
  "severity": "high"
}"#;
		let feedback = DetailedFeedback::from_text(text).unwrap();
		assert_eq!(feedback.severity, Priority::High);
		assert_eq!(feedback.suggestions.len(), 1);
		assert_eq!(feedback.suggestions[0].rationale, "Scopes the claim.");
	}

	#[test]
	fn rejects_missing_or_unknown_fields() {
		assert!(matches!(DetailedFeedback::from_text("no json"), Err(ClientError::Decode(_))));
		assert!(matches!(
			DetailedFeedback::from_text(r#"{"explanation": "x", "severity": "critical"}"#),
			Err(ClientError::Decode(_))
		));
	}
}
