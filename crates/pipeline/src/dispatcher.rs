//! Single-flight analysis dispatch with stale-result discard.
//!
//! [`Dispatcher`] owns the in-flight task registry and the last-analyzed map for
//! every paragraph. Analyses run on spawned tasks; their results come back as
//! [`TaskMessage`]s that the owner feeds to [`Dispatcher::complete`], so every
//! mutation of the highlight collection happens on the owner's task.
//!
//! # Ordering
//!
//! A result is applied only if its task is still the registered one for the
//! paragraph *and* the paragraph's current content equals the task's snapshot.
//! Completion order therefore never matters: an older call finishing late finds
//! itself superseded or stale.

use std::sync::Arc;

use drafter_client::{AnalysisClient, AnalysisRequest, ClientError, Endpoint, ProgressFn};
use drafter_config::SettingsSource;
use drafter_primitives::{ParagraphId, is_blank};
use drafter_spans::{SpanCorrector, into_highlights};
use drafter_worker::{TaskClass, TaskClock, TaskId, TaskToken};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::collection::{HighlightCollection, Removal};
use crate::report::{DispatchStats, FailureReporter, TracingReporter};
use crate::store::ParagraphStore;
use crate::task::{AnalysisTask, TaskMessage, TaskMessageKind, Trigger};
use crate::Result;


/// What [`Dispatcher::dispatch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// A new analysis is running.
	Started(TaskId),
	/// An analysis of this exact content is already running.
	AlreadyRunning(TaskId),
	/// This content was already analyzed successfully.
	Skipped,
	/// The paragraph is blank; its highlights were cleared.
	Cleared(Removal),
	/// No such paragraph.
	Missing,
}

/// What [`Dispatcher::complete`] did with a task message.
#[derive(Debug)]
pub enum Completion {
	/// Validated highlights replaced the paragraph's set.
	Applied { highlights: usize, dropped: usize },
	/// The paragraph changed during the call; result dropped.
	Stale,
	/// The task was cancelled; nothing to apply.
	Cancelled,
	/// A newer task or an edit replaced this one before it finished.
	Superseded,
	/// The call failed; highlights untouched.
	Failed(ClientError),
	/// Streamed span count for the current task.
	Progress(usize),
	/// Progress from a task that is no longer current.
	Ignored,
}

/// Effect of [`Dispatcher::on_content_changed`] and [`Dispatcher::remove_paragraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
	/// An in-flight analysis was cancelled.
	pub cancelled: Option<TaskId>,
	pub removal: Removal,
}

/// Per-session owner of analysis tasks.
pub struct Dispatcher {
	client: Arc<dyn AnalysisClient>,
	settings: Arc<dyn SettingsSource>,
	reporter: Arc<dyn FailureReporter>,
	clock: TaskClock,
	root: TaskToken,
	running: FxHashMap<ParagraphId, AnalysisTask>,
	last_analyzed: FxHashMap<ParagraphId, String>,
	tx: mpsc::UnboundedSender<TaskMessage>,
	rx: mpsc::UnboundedReceiver<TaskMessage>,
	stats: DispatchStats,
}

impl Dispatcher {
	pub fn new(client: Arc<dyn AnalysisClient>, settings: Arc<dyn SettingsSource>) -> Self {
		Self::with_parent(client, settings, CancellationToken::new())
	}

	/// Creates a dispatcher whose tasks are all cancelled when `parent` is.
	pub fn with_parent(client: Arc<dyn AnalysisClient>, settings: Arc<dyn SettingsSource>, parent: CancellationToken) -> Self {
		let clock = TaskClock::new();
		let root = TaskToken::new(clock.next(), parent.child_token());
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			client,
			settings,
			reporter: Arc::new(TracingReporter),
			clock,
			root,
			running: FxHashMap::default(),
			last_analyzed: FxHashMap::default(),
			tx,
			rx,
			stats: DispatchStats::default(),
		}
	}

	pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
		self.set_reporter(reporter);
		self
	}

	pub fn set_reporter(&mut self, reporter: Arc<dyn FailureReporter>) {
		self.reporter = reporter;
	}

	/// Starts analyzing `id` unless its current content is blank, already analyzed, or already running.
	///
	/// A running task for older content is cancelled first. Settings are read
	/// now, so a missing API key fails here without touching any state.
	pub fn dispatch(
		&mut self,
		id: &ParagraphId,
		store: &ParagraphStore,
		highlights: &mut HighlightCollection,
		trigger: Trigger,
	) -> Result<DispatchOutcome> {
		let Some(content) = store.content(id) else {
			return Ok(DispatchOutcome::Missing);
		};

		if is_blank(content) {
			let invalidation = self.invalidate(id, highlights);
			self.last_analyzed.remove(id);
			return Ok(DispatchOutcome::Cleared(invalidation.removal));
		}
		if self.last_analyzed.get(id).is_some_and(|done| done == content) {
			self.stats.skipped += 1;
			tracing::trace!(paragraph = %id, "analysis.skip");
			return Ok(DispatchOutcome::Skipped);
		}
		if let Some(task) = self.running.get(id)
			&& task.snapshot == content
		{
			return Ok(DispatchOutcome::AlreadyRunning(task.id()));
		}

		let settings = self.settings.current();
		let endpoint = Endpoint::new(settings.base_url.clone(), settings.credentials()?);

		if let Some(previous) = self.running.remove(id) {
			previous.token.cancel();
			self.stats.cancelled += 1;
			tracing::debug!(paragraph = %id, task = %previous.id(), "analysis.supersede");
		}

		let token = self.root.derive(self.clock.next());
		let task_id = token.id();
		let progress: Option<ProgressFn> = settings.stream.then(|| {
			let tx = self.tx.clone();
			let paragraph = id.clone();
			Arc::new(move |spans: usize| {
				let _ = tx.send(TaskMessage {
					task: task_id,
					paragraph: paragraph.clone(),
					kind: TaskMessageKind::Progress(spans),
				});
			}) as ProgressFn
		});
		let request = AnalysisRequest {
			paragraph_id: id.clone(),
			text: content.to_string(),
			context: settings.document_context.then(|| store.context(id)),
			model: settings.model.clone(),
			endpoint,
			max_tokens: settings.max_tokens,
			stream: settings.stream,
			progress,
		};

		let client = Arc::clone(&self.client);
		let tx = self.tx.clone();
		let call = token.child();
		let paragraph = id.clone();
		drafter_worker::spawn(TaskClass::Analysis, async move {
			let result = tokio::select! {
				biased;
				_ = call.cancelled() => Err(ClientError::Cancelled),
				result = client.analyze(request, call.cancellation()) => result,
			};
			let _ = tx.send(TaskMessage {
				task: task_id,
				paragraph,
				kind: TaskMessageKind::Done(result),
			});
		});

		self.running.insert(
			id.clone(),
			AnalysisTask {
				token,
				snapshot: content.to_string(),
				started_at: Instant::now(),
				trigger,
				correction_window: settings.correction_window,
				preview_chars: settings.preview_chars,
			},
		);
		self.stats.dispatched += 1;
		tracing::debug!(paragraph = %id, task = %task_id, trigger = trigger.as_str(), model = %settings.model, "analysis.dispatch");
		Ok(DispatchOutcome::Started(task_id))
	}

	/// Applies a message from a spawned task.
	pub fn complete(&mut self, message: TaskMessage, store: &ParagraphStore, highlights: &mut HighlightCollection) -> Completion {
		let TaskMessage { task, paragraph, kind } = message;
		let is_current = self.running.get(&paragraph).is_some_and(|t| t.id() == task);

		let result = match kind {
			TaskMessageKind::Progress(spans) if is_current => return Completion::Progress(spans),
			TaskMessageKind::Progress(_) => return Completion::Ignored,
			TaskMessageKind::Done(result) => result,
		};

		if !is_current {
			tracing::trace!(paragraph = %paragraph, task = %task, "analysis.superseded");
			return match result {
				Err(err) if err.is_cancelled() => Completion::Cancelled,
				_ => Completion::Superseded,
			};
		}
		let Some(done) = self.running.remove(&paragraph) else {
			return Completion::Superseded;
		};
		let elapsed_ms = done.started_at.elapsed().as_millis() as u64;

		let response = match result {
			Ok(response) => response,
			Err(err) if err.is_cancelled() => {
				self.stats.cancelled += 1;
				return Completion::Cancelled;
			}
			Err(err) => {
				self.stats.failed += 1;
				self.reporter.report(&paragraph, &err);
				return Completion::Failed(err);
			}
		};

		if store.content(&paragraph) != Some(done.snapshot.as_str()) {
			self.stats.stale += 1;
			tracing::debug!(paragraph = %paragraph, task = %task, elapsed_ms, "analysis.stale");
			return Completion::Stale;
		}

		let received = response.spans.len();
		let valid = SpanCorrector::new(done.correction_window).validate(&done.snapshot, &response.spans);
		let applied = into_highlights(&paragraph, valid, done.preview_chars);
		let count = applied.len();
		highlights.replace(&paragraph, applied);
		self.last_analyzed.insert(paragraph.clone(), done.snapshot);
		self.stats.applied += 1;
		tracing::debug!(
			paragraph = %paragraph,
			task = %task,
			trigger = done.trigger.as_str(),
			highlights = count,
			dropped = received - count,
			elapsed_ms,
			"analysis.applied"
		);
		Completion::Applied {
			highlights: count,
			dropped: received - count,
		}
	}

	/// Reacts to new content for `id`: cancels its analysis, drops its highlights
	/// and selection, and forgets what was last analyzed.
	pub fn on_content_changed(&mut self, id: &ParagraphId, highlights: &mut HighlightCollection) -> Invalidation {
		let invalidation = self.invalidate(id, highlights);
		self.last_analyzed.remove(id);
		invalidation
	}

	/// Forgets a deleted paragraph.
	pub fn remove_paragraph(&mut self, id: &ParagraphId, highlights: &mut HighlightCollection) -> Invalidation {
		let invalidation = self.invalidate(id, highlights);
		self.last_analyzed.remove(id);
		tracing::debug!(paragraph = %id, "analysis.forget");
		invalidation
	}

	fn invalidate(&mut self, id: &ParagraphId, highlights: &mut HighlightCollection) -> Invalidation {
		let cancelled = self.running.remove(id).map(|task| {
			task.token.cancel();
			self.stats.cancelled += 1;
			tracing::debug!(paragraph = %id, task = %task.id(), "analysis.cancel");
			task.id()
		});
		Invalidation {
			cancelled,
			removal: highlights.remove_paragraph(id),
		}
	}

	pub fn is_analyzing(&self, id: &ParagraphId) -> bool {
		self.running.contains_key(id)
	}

	/// Paragraphs with a running analysis, sorted by id.
	pub fn analyzing(&self) -> Vec<ParagraphId> {
		let mut ids: Vec<ParagraphId> = self.running.keys().cloned().collect();
		ids.sort();
		ids
	}

	/// Whether `content` is exactly what was last analyzed for `id`.
	pub fn is_analyzed(&self, id: &ParagraphId, content: &str) -> bool {
		self.last_analyzed.get(id).is_some_and(|done| done == content)
	}

	/// Next message from a spawned task.
	pub async fn next_message(&mut self) -> Option<TaskMessage> {
		self.rx.recv().await
	}

	/// Cancels every task. Messages still in the channel become no-ops.
	pub fn shutdown(&mut self) {
		self.root.cancel();
		self.stats.cancelled += self.running.len() as u64;
		self.running.clear();
		tracing::debug!("analysis.shutdown");
	}

	pub fn stats(&self) -> DispatchStats {
		self.stats
	}
}
