use std::time::{Duration, Instant};

use async_trait::async_trait;
use drafter_spans::PartialSpanParser;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::sse::{SseDecoder, StreamEvent};
use crate::{AnalysisClient, AnalysisRequest, AnalysisResponse, ClientError, Endpoint, Result, prompt};

/// `anthropic-version` header value sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// [`AnalysisClient`] backed by the Anthropic Messages API.
///
/// Holds only the HTTP connection pool; endpoint, key, and model come with each
/// request so settings changes apply to the next call.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
	http: Client,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
	#[serde(default)]
	content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	text: Option<String>,
}

impl AnthropicClient {
	pub fn new() -> Result<Self> {
		let http = Client::builder().connect_timeout(Duration::from_secs(10)).build()?;
		Ok(Self { http })
	}

	/// Wraps an existing HTTP client.
	pub fn with_http(http: Client) -> Self {
		Self { http }
	}

	pub(crate) fn request(&self, method: reqwest::Method, endpoint: &Endpoint, path: &str) -> Result<RequestBuilder> {
		let key = endpoint.api_key.trim();
		if key.is_empty() {
			return Err(ClientError::MissingCredentials);
		}
		Ok(self
			.http
			.request(method, endpoint.url(path))
			.header("x-api-key", key)
			.header("anthropic-version", ANTHROPIC_VERSION))
	}

	/// Sends a request and turns non-success statuses into [`ClientError::Status`].
	pub(crate) async fn send(builder: RequestBuilder) -> Result<Response> {
		let response = builder.send().await?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		let body = response.text().await.unwrap_or_default();
		Err(ClientError::Status {
			status: status.as_u16(),
			body: error_message(&body),
		})
	}

	/// Posts a non-streaming Messages request and returns the first text block.
	pub(crate) async fn complete(&self, endpoint: &Endpoint, model: &str, max_tokens: u32, prompt: String) -> Result<String> {
		let body = message_body(model, max_tokens, false, prompt);
		let builder = self.request(reqwest::Method::POST, endpoint, "v1/messages")?.json(&body);
		let response = Self::send(builder).await?;
		let message: MessageResponse = response.json().await?;
		first_text(message).ok_or_else(|| ClientError::Decode("response has no text content block".into()))
	}

	async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
		if request.text.trim().is_empty() {
			return Ok(AnalysisResponse::default());
		}
		let prompt = prompt::triage(&request.text, request.context.as_ref());
		if !request.stream {
			let text = self
				.complete(&request.endpoint, &request.model, request.max_tokens, prompt)
				.await?;
			return Ok(AnalysisResponse::from_text(text));
		}

		let body = message_body(&request.model, request.max_tokens, true, prompt);
		let builder = self.request(reqwest::Method::POST, &request.endpoint, "v1/messages")?.json(&body);
		let response = Self::send(builder).await?;
		let text = self.read_stream(request, response).await?;
		Ok(AnalysisResponse::from_text(text))
	}

	async fn read_stream(&self, request: &AnalysisRequest, response: Response) -> Result<String> {
		let mut chunks = response.bytes_stream();
		let mut decoder = SseDecoder::new();
		let mut partial = PartialSpanParser::new();
		let mut text = String::new();

		while let Some(chunk) = chunks.next().await {
			for event in decoder.push(&chunk?) {
				match event {
					StreamEvent::Delta(delta) => {
						text.push_str(&delta);
						if partial.push(&delta) > 0 {
							tracing::trace!(paragraph = %request.paragraph_id, spans = partial.spans().len(), "client.stream.delta");
							if let Some(progress) = &request.progress {
								progress(partial.spans().len());
							}
						}
					}
					StreamEvent::Stop => return Ok(text),
					StreamEvent::Error(message) => return Err(ClientError::Remote(message)),
				}
			}
		}
		if let Some(StreamEvent::Delta(delta)) = decoder.finish() {
			text.push_str(&delta);
		}
		Ok(text)
	}
}

#[async_trait]
impl AnalysisClient for AnthropicClient {
	async fn analyze(&self, request: AnalysisRequest, cancel: CancellationToken) -> Result<AnalysisResponse> {
		let started = Instant::now();
		let result = tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(ClientError::Cancelled),
			result = self.run(&request) => result,
		};
		match &result {
			Ok(response) => tracing::debug!(
				paragraph = %request.paragraph_id,
				spans = response.spans.len(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"client.analyze.done"
			),
			Err(err) => tracing::debug!(paragraph = %request.paragraph_id, error = %err, "client.analyze.error"),
		}
		result
	}
}

fn message_body(model: &str, max_tokens: u32, stream: bool, prompt: String) -> serde_json::Value {
	json!({
		"model": model,
		"max_tokens": max_tokens,
		"temperature": 0,
		"stream": stream,
		"messages": [{ "role": "user", "content": prompt }],
	})
}

fn first_text(message: MessageResponse) -> Option<String> {
	message.content.into_iter().find(|block| block.kind == "text").and_then(|block| block.text)
}

/// Pulls `error.message` out of an API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
	serde_json::from_str::<serde_json::Value>(body)
		.ok()
		.and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
		.unwrap_or_else(|| body.trim().to_string())
}
