//! Scripted [`AnalysisClient`] for tests.
//!
//! Replies are taken from a per-paragraph queue, then a per-paragraph default, then
//! a global default (`{"spans":[]}`). Calls can be held at a gate until released,
//! which makes "edit while the request is in flight" scenarios deterministic.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use drafter_primitives::ParagraphId;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::{AnalysisClient, AnalysisRequest, AnalysisResponse, ClientError, Result};

/// Canned outcome for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
	/// Model text; decoded exactly like a real response.
	Text(String),
	Status(u16),
	Transport(String),
}

impl MockReply {
	pub fn spans_json(json: impl Into<String>) -> Self {
		Self::Text(json.into())
	}
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
	pub paragraph_id: ParagraphId,
	pub text: String,
	pub model: String,
	pub api_key: String,
	pub had_context: bool,
}

#[derive(Debug, Default)]
struct MockState {
	calls: Vec<MockCall>,
	queued: HashMap<ParagraphId, VecDeque<MockReply>>,
	defaults: HashMap<ParagraphId, MockReply>,
	fallback: Option<MockReply>,
	gate: Option<Arc<Semaphore>>,
	cancelled: usize,
	finished: usize,
}

/// In-memory [`AnalysisClient`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
	state: Arc<Mutex<MockState>>,
}

impl MockClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reply used when nothing more specific is scripted.
	pub fn respond_with(&self, reply: MockReply) -> &Self {
		self.state.lock().fallback = Some(reply);
		self
	}

	/// Reply for every call on `paragraph` once its queue is empty.
	pub fn respond_for(&self, paragraph: impl Into<ParagraphId>, reply: MockReply) -> &Self {
		self.state.lock().defaults.insert(paragraph.into(), reply);
		self
	}

	/// Reply for the next call on `paragraph` only.
	pub fn push_reply(&self, paragraph: impl Into<ParagraphId>, reply: MockReply) -> &Self {
		self.state.lock().queued.entry(paragraph.into()).or_default().push_back(reply);
		self
	}

	/// Makes subsequent calls wait until [`release`](Self::release)d or cancelled.
	pub fn hold(&self) {
		self.state.lock().gate = Some(Arc::new(Semaphore::new(0)));
	}

	/// Lets `n` held calls proceed.
	pub fn release(&self, n: usize) {
		if let Some(gate) = &self.state.lock().gate {
			gate.add_permits(n);
		}
	}

	/// Releases every waiting call and stops holding new ones.
	pub fn release_all(&self) {
		if let Some(gate) = self.state.lock().gate.take() {
			gate.close();
		}
	}

	pub fn calls(&self) -> Vec<MockCall> {
		self.state.lock().calls.clone()
	}

	pub fn call_count(&self) -> usize {
		self.state.lock().calls.len()
	}

	pub fn calls_for(&self, paragraph: &str) -> usize {
		self.state.lock().calls.iter().filter(|c| c.paragraph_id.as_str() == paragraph).count()
	}

	/// Calls that observed their cancellation token.
	pub fn cancelled_count(&self) -> usize {
		self.state.lock().cancelled
	}

	/// Calls that returned a reply (success or scripted failure).
	pub fn finished_count(&self) -> usize {
		self.state.lock().finished
	}

	fn begin(&self, request: &AnalysisRequest) -> (MockReply, Option<Arc<Semaphore>>) {
		let mut state = self.state.lock();
		state.calls.push(MockCall {
			paragraph_id: request.paragraph_id.clone(),
			text: request.text.clone(),
			model: request.model.clone(),
			api_key: request.endpoint.api_key.clone(),
			had_context: request.context.is_some(),
		});
		let queued = state.queued.get_mut(&request.paragraph_id).and_then(VecDeque::pop_front);
		let reply = queued
			.or_else(|| state.defaults.get(&request.paragraph_id).cloned())
			.or_else(|| state.fallback.clone())
			.unwrap_or_else(|| MockReply::Text(r#"{"spans":[]}"#.into()));
		(reply, state.gate.clone())
	}
}

#[async_trait]
impl AnalysisClient for MockClient {
	async fn analyze(&self, request: AnalysisRequest, cancel: CancellationToken) -> Result<AnalysisResponse> {
		let (reply, gate) = self.begin(&request);

		if let Some(gate) = gate {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => {}
				permit = gate.acquire() => {
					if let Ok(permit) = permit {
						permit.forget();
					}
				}
			}
		}
		if cancel.is_cancelled() {
			self.state.lock().cancelled += 1;
			return Err(ClientError::Cancelled);
		}

		self.state.lock().finished += 1;
		match reply {
			MockReply::Text(text) => {
				let response = AnalysisResponse::from_text(text);
				if let Some(progress) = &request.progress
					&& !response.spans.is_empty()
				{
					progress(response.spans.len());
				}
				Ok(response)
			}
			MockReply::Status(status) => Err(ClientError::Status {
				status,
				body: "scripted failure".into(),
			}),
			MockReply::Transport(message) => Err(ClientError::Transport(message)),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::Endpoint;

	fn request(paragraph: &str) -> AnalysisRequest {
		AnalysisRequest {
			paragraph_id: paragraph.into(),
			text: "text".into(),
			context: None,
			model: "m".into(),
			endpoint: Endpoint::new("http://mock", "k"),
			max_tokens: 16,
			stream: false,
			progress: None,
		}
	}

	#[tokio::test]
	async fn replies_follow_queue_then_defaults() {
		let mock = MockClient::new();
		mock.respond_for("p1", MockReply::Status(500))
			.push_reply("p1", MockReply::spans_json(r#"{"spans":[{"text":"t","startOffset":0,"endOffset":1}]}"#));

		let first = mock.analyze(request("p1"), CancellationToken::new()).await.unwrap();
		assert_eq!(first.spans.len(), 1);
		let second = mock.analyze(request("p1"), CancellationToken::new()).await.unwrap_err();
		assert!(matches!(second, ClientError::Status { status: 500, .. }));
		let other = mock.analyze(request("p2"), CancellationToken::new()).await.unwrap();
		assert!(other.spans.is_empty());
		assert_eq!(mock.calls_for("p1"), 2);
		assert_eq!(mock.call_count(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn held_calls_wait_for_release_or_cancel() {
		let mock = MockClient::new();
		mock.hold();

		let cancel = CancellationToken::new();
		let held = tokio::spawn({
			let mock = mock.clone();
			let cancel = cancel.clone();
			async move { mock.analyze(request("p1"), cancel).await }
		});
		let released = tokio::spawn({
			let mock = mock.clone();
			async move { mock.analyze(request("p2"), CancellationToken::new()).await }
		});

		tokio::time::sleep(Duration::from_millis(10)).await;
		assert_eq!(mock.call_count(), 2);
		assert_eq!(mock.finished_count(), 0);

		cancel.cancel();
		assert!(held.await.unwrap().unwrap_err().is_cancelled());
		mock.release(1);
		assert!(released.await.unwrap().is_ok());
		assert_eq!(mock.cancelled_count(), 1);
		assert_eq!(mock.finished_count(), 1);
	}
}
