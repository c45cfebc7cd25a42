//! The session event loop: one task owning the store, scheduler, dispatcher,
//! and highlight collection.
//!
//! Consumers talk to it through a cloneable [`SessionHandle`]: commands go in
//! over an mpsc channel, a `watch` channel carries the latest [`HighlightView`],
//! and a `broadcast` channel carries [`PipelineEvent`]s. Nothing outside the loop
//! ever mutates pipeline state.

use std::sync::Arc;

use drafter_client::{AnalysisClient, ErrorKind};
use drafter_config::SettingsSource;
use drafter_primitives::{HighlightId, Paragraph, ParagraphId, is_blank};
use drafter_worker::TaskClass;
use rustc_hash::FxHashSet;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collection::HighlightCollection;
use crate::debounce::DebounceScheduler;
use crate::dispatcher::{Completion, DispatchOutcome, Dispatcher, Invalidation};
use crate::event::{DiscardReason, HighlightView, PipelineEvent};
use crate::report::{DispatchStats, FailureReporter};
use crate::store::{ContentChange, ParagraphStore};
use crate::task::{TaskMessage, Trigger};
use crate::{DispatchError, SessionError};

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

enum Command {
	SetParagraphs(Vec<Paragraph>),
	Edit {
		id: ParagraphId,
		content: String,
	},
	Split {
		prior: ParagraphId,
		paragraph: Paragraph,
	},
	Delete(ParagraphId),
	AnalyzeNow {
		id: ParagraphId,
		reply: oneshot::Sender<Result<DispatchOutcome, DispatchError>>,
	},
	Select(Option<HighlightId>),
	Stats(oneshot::Sender<DispatchStats>),
	Shutdown,
}

enum Step {
	Command(Command),
	Task(TaskMessage),
	Ready(ParagraphId),
	Shutdown,
}

/// Owner of all pipeline state. Run it with [`spawn`](Self::spawn) or [`run`](Self::run).
pub struct Session {
	store: ParagraphStore,
	scheduler: DebounceScheduler,
	dispatcher: Dispatcher,
	highlights: HighlightCollection,
	settings: Arc<dyn SettingsSource>,
	commands: mpsc::Receiver<Command>,
	view: watch::Sender<HighlightView>,
	events: broadcast::Sender<PipelineEvent>,
	cancel: CancellationToken,
	revision: u64,
}

impl Session {
	pub fn new(client: Arc<dyn AnalysisClient>, settings: Arc<dyn SettingsSource>) -> (Self, SessionHandle) {
		let cancel = CancellationToken::new();
		let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
		let (view_tx, view_rx) = watch::channel(HighlightView::default());
		let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
		let quiet = settings.current().quiet_period;

		let session = Self {
			store: ParagraphStore::new(),
			scheduler: DebounceScheduler::new(quiet),
			dispatcher: Dispatcher::with_parent(client, Arc::clone(&settings), cancel.clone()),
			highlights: HighlightCollection::new(),
			settings,
			commands: command_rx,
			view: view_tx,
			events: event_tx.clone(),
			cancel: cancel.clone(),
			revision: 0,
		};
		let handle = SessionHandle {
			commands: command_tx,
			view: view_rx,
			events: event_tx,
			cancel,
		};
		(session, handle)
	}

	pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
		self.dispatcher.set_reporter(reporter);
		self
	}

	/// Runs the loop on a worker task.
	pub fn spawn(self) -> JoinHandle<()> {
		drafter_worker::spawn(TaskClass::Session, self.run())
	}

	/// Processes commands, ready timers, and task messages until shut down or every handle is dropped.
	pub async fn run(mut self) {
		tracing::debug!("session.start");
		loop {
			let step = tokio::select! {
				biased;
				_ = self.cancel.cancelled() => Step::Shutdown,
				command = self.commands.recv() => match command {
					Some(Command::Shutdown) | None => Step::Shutdown,
					Some(command) => Step::Command(command),
				},
				Some(message) = self.dispatcher.next_message() => Step::Task(message),
				id = self.scheduler.next_ready() => Step::Ready(id),
			};

			match step {
				Step::Command(command) => self.handle_command(command),
				Step::Task(message) => self.handle_message(message),
				Step::Ready(id) => {
					let _ = self.dispatch(&id, Trigger::Debounced);
				}
				Step::Shutdown => break,
			}
			self.publish();
		}

		self.scheduler.shutdown();
		self.dispatcher.shutdown();
		self.publish();
		tracing::debug!(stats = ?self.dispatcher.stats(), "session.stop");
	}

	fn handle_command(&mut self, command: Command) {
		match command {
			Command::SetParagraphs(paragraphs) => self.set_paragraphs(paragraphs),
			Command::Edit { id, content } => self.apply_content(&id, &content),
			Command::Split { prior, paragraph } => self.split(prior, paragraph),
			Command::Delete(id) => self.delete(&id),
			Command::AnalyzeNow { id, reply } => {
				self.scheduler.cancel(&id);
				let outcome = self.dispatch(&id, Trigger::Explicit);
				// Reply only once the view reflects the dispatch.
				self.publish();
				let _ = reply.send(outcome);
			}
			Command::Select(selected) => {
				if self.highlights.select(selected.clone()) {
					self.emit(PipelineEvent::SelectionChanged { selected });
				}
			}
			Command::Stats(reply) => {
				let _ = reply.send(self.dispatcher.stats());
			}
			Command::Shutdown => self.cancel.cancel(),
		}
	}

	fn handle_message(&mut self, message: TaskMessage) {
		let paragraph = message.paragraph.clone();
		let event = match self.dispatcher.complete(message, &self.store, &mut self.highlights) {
			Completion::Applied { highlights, .. } => PipelineEvent::HighlightsReplaced {
				paragraph,
				count: highlights,
			},
			Completion::Stale => PipelineEvent::Discarded {
				paragraph,
				reason: DiscardReason::Stale,
			},
			Completion::Cancelled => PipelineEvent::Discarded {
				paragraph,
				reason: DiscardReason::Cancelled,
			},
			Completion::Superseded => PipelineEvent::Discarded {
				paragraph,
				reason: DiscardReason::Superseded,
			},
			Completion::Failed(err) => PipelineEvent::Failed {
				paragraph,
				kind: err.kind(),
				message: err.to_string(),
			},
			Completion::Progress(spans) => PipelineEvent::Progress { paragraph, spans },
			Completion::Ignored => return,
		};
		self.emit(event);
	}

	/// Records new content: clears stale highlights now, then restarts the paragraph's timer.
	fn apply_content(&mut self, id: &ParagraphId, content: &str) {
		if self.store.set(id, content) == ContentChange::Unchanged {
			return;
		}
		let invalidation = self.dispatcher.on_content_changed(id, &mut self.highlights);
		self.emit_invalidation(id, invalidation);
		self.scheduler.set_quiet_period(self.settings.current().quiet_period);
		self.scheduler.observe(id, content);
	}

	fn set_paragraphs(&mut self, paragraphs: Vec<Paragraph>) {
		let keep: FxHashSet<&ParagraphId> = paragraphs.iter().map(|p| &p.id).collect();
		let removed: Vec<ParagraphId> = self.store.ids().iter().filter(|id| !keep.contains(id)).cloned().collect();
		for id in &removed {
			self.delete(id);
		}
		let order: Vec<ParagraphId> = paragraphs.iter().map(|p| p.id.clone()).collect();
		for paragraph in &paragraphs {
			self.apply_content(&paragraph.id, &paragraph.content);
		}
		self.store.reorder(&order);
	}

	/// Inserts the new paragraph and analyzes the prior one without waiting.
	fn split(&mut self, prior: ParagraphId, paragraph: Paragraph) {
		let id = paragraph.id.clone();
		let content = paragraph.content.clone();
		if self.store.insert_after(&prior, paragraph) != ContentChange::Unchanged {
			let invalidation = self.dispatcher.on_content_changed(&id, &mut self.highlights);
			self.emit_invalidation(&id, invalidation);
			self.scheduler.observe(&id, &content);
		}

		let analyze_prior = self.store.content(&prior).is_some_and(|text| {
			!is_blank(text) && !self.dispatcher.is_analyzed(&prior, text) && !self.dispatcher.is_analyzing(&prior)
		});
		if analyze_prior {
			self.scheduler.cancel(&prior);
			let _ = self.dispatch(&prior, Trigger::Split);
		}
	}

	fn delete(&mut self, id: &ParagraphId) {
		self.store.remove(id);
		self.scheduler.remove(id);
		let invalidation = self.dispatcher.remove_paragraph(id, &mut self.highlights);
		self.emit_invalidation(id, invalidation);
	}

	fn dispatch(&mut self, id: &ParagraphId, trigger: Trigger) -> Result<DispatchOutcome, DispatchError> {
		let outcome = self.dispatcher.dispatch(id, &self.store, &mut self.highlights, trigger);
		match &outcome {
			Ok(DispatchOutcome::Started(task)) => self.emit(PipelineEvent::AnalysisStarted {
				paragraph: id.clone(),
				task: *task,
			}),
			Ok(DispatchOutcome::Cleared(removal)) => self.emit_invalidation(
				id,
				Invalidation {
					cancelled: None,
					removal: *removal,
				},
			),
			Ok(_) => {}
			Err(err) => {
				tracing::warn!(paragraph = %id, error = %err, "session.dispatch_failed");
				self.emit(PipelineEvent::Failed {
					paragraph: id.clone(),
					kind: ErrorKind::Configuration,
					message: err.to_string(),
				});
			}
		}
		outcome
	}

	fn emit_invalidation(&self, id: &ParagraphId, invalidation: Invalidation) {
		if invalidation.removal.removed > 0 {
			self.emit(PipelineEvent::HighlightsCleared {
				paragraph: id.clone(),
				removed: invalidation.removal.removed,
			});
		}
		if invalidation.removal.selection_cleared {
			self.emit(PipelineEvent::SelectionChanged { selected: None });
		}
	}

	fn emit(&self, event: PipelineEvent) {
		tracing::trace!(?event, "session.event");
		let _ = self.events.send(event);
	}

	/// Publishes a new view if anything visible changed.
	fn publish(&mut self) {
		let mut next = HighlightView {
			highlights: self.highlights.in_order(self.store.ids()).cloned().collect(),
			analyzing: self.dispatcher.analyzing(),
			selected: self.highlights.selected().cloned(),
			revision: self.revision,
		};
		let revision = &mut self.revision;
		self.view.send_if_modified(|current| {
			if current.highlights == next.highlights && current.analyzing == next.analyzing && current.selected == next.selected {
				return false;
			}
			*revision += 1;
			next.revision = *revision;
			*current = next;
			true
		});
	}
}

/// Cloneable front end of a running [`Session`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
	commands: mpsc::Sender<Command>,
	view: watch::Receiver<HighlightView>,
	events: broadcast::Sender<PipelineEvent>,
	cancel: CancellationToken,
}

impl SessionHandle {
	async fn send(&self, command: Command) -> Result<(), SessionError> {
		self.commands.send(command).await.map_err(|_| SessionError::Closed)
	}

	/// Replaces the whole document. Unlisted paragraphs are deleted.
	pub async fn set_paragraphs(&self, paragraphs: Vec<Paragraph>) -> Result<(), SessionError> {
		self.send(Command::SetParagraphs(paragraphs)).await
	}

	/// Reports new content for one paragraph.
	pub async fn edit(&self, id: impl Into<ParagraphId>, content: impl Into<String>) -> Result<(), SessionError> {
		self.send(Command::Edit {
			id: id.into(),
			content: content.into(),
		})
		.await
	}

	/// Reports that `prior` was split and `paragraph` now follows it.
	pub async fn split(&self, prior: impl Into<ParagraphId>, paragraph: Paragraph) -> Result<(), SessionError> {
		self.send(Command::Split {
			prior: prior.into(),
			paragraph,
		})
		.await
	}

	pub async fn delete(&self, id: impl Into<ParagraphId>) -> Result<(), SessionError> {
		self.send(Command::Delete(id.into())).await
	}

	/// Dispatches analysis of `id` immediately, bypassing the quiet period.
	///
	/// When this returns, the published view already reflects the dispatch.
	pub async fn analyze_now(&self, id: impl Into<ParagraphId>) -> Result<DispatchOutcome, SessionError> {
		let (reply, outcome) = oneshot::channel();
		self.send(Command::AnalyzeNow { id: id.into(), reply }).await?;
		Ok(outcome.await.map_err(|_| SessionError::Closed)??)
	}

	/// Selects a highlight, or clears the selection with `None`.
	pub async fn select(&self, id: Option<HighlightId>) -> Result<(), SessionError> {
		self.send(Command::Select(id)).await
	}

	pub async fn stats(&self) -> Result<DispatchStats, SessionError> {
		let (reply, stats) = oneshot::channel();
		self.send(Command::Stats(reply)).await?;
		stats.await.map_err(|_| SessionError::Closed)
	}

	/// Stops the session after the commands already queued.
	pub async fn shutdown(&self) {
		let _ = self.commands.send(Command::Shutdown).await;
	}

	/// Stops the session immediately.
	pub fn abort(&self) {
		self.cancel.cancel();
	}

	/// Receiver for view updates.
	pub fn view(&self) -> watch::Receiver<HighlightView> {
		self.view.clone()
	}

	/// The latest published view.
	pub fn snapshot(&self) -> HighlightView {
		self.view.borrow().clone()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
		self.events.subscribe()
	}

	/// Waits until no paragraph is being analyzed and returns that view.
	pub async fn wait_idle(&self) -> Result<HighlightView, SessionError> {
		let mut view = self.view.clone();
		let idle = view.wait_for(|v| v.analyzing.is_empty()).await.map_err(|_| SessionError::Closed)?;
		Ok(idle.clone())
	}
}
