//! Per-paragraph debounce timers.

use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::Duration;

use drafter_primitives::{ParagraphId, is_blank};
use rustc_hash::FxHashMap;
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;

/// Default quiet period before a changed paragraph is reported ready.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// What [`DebounceScheduler::observe`] did with a content event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
	/// Same content as last seen; nothing changed.
	Unchanged,
	/// Timer (re)started.
	Scheduled,
	/// Content became blank; any pending timer was dropped.
	Cleared,
}

/// Turns per-paragraph content events into one ready signal per quiet period.
///
/// Each paragraph has an independent timer. A paragraph whose content keeps
/// changing never fires; one whose content becomes blank never fires. Removing a
/// paragraph drops its timer and remembered content.
#[derive(Debug)]
pub struct DebounceScheduler {
	quiet: Duration,
	queue: DelayQueue<ParagraphId>,
	timers: FxHashMap<ParagraphId, Key>,
	last_seen: FxHashMap<ParagraphId, String>,
	shut_down: bool,
}

impl Default for DebounceScheduler {
	fn default() -> Self {
		Self::new(DEFAULT_QUIET_PERIOD)
	}
}

impl DebounceScheduler {
	pub fn new(quiet: Duration) -> Self {
		Self {
			quiet,
			queue: DelayQueue::new(),
			timers: FxHashMap::default(),
			last_seen: FxHashMap::default(),
			shut_down: false,
		}
	}

	pub fn quiet_period(&self) -> Duration {
		self.quiet
	}

	/// Applies to timers started after this call.
	pub fn set_quiet_period(&mut self, quiet: Duration) {
		self.quiet = quiet;
	}

	/// Records the latest content for `id`.
	///
	/// Content equal to the last observation (initially empty) is ignored.
	pub fn observe(&mut self, id: &ParagraphId, content: &str) -> Observed {
		if self.shut_down {
			return Observed::Unchanged;
		}
		let previous = self.last_seen.get(id).map_or("", String::as_str);
		if previous == content {
			return Observed::Unchanged;
		}
		self.last_seen.insert(id.clone(), content.to_string());
		self.cancel(id);

		if is_blank(content) {
			tracing::trace!(paragraph = %id, "debounce.cleared");
			return Observed::Cleared;
		}
		let key = self.queue.insert(id.clone(), self.quiet);
		self.timers.insert(id.clone(), key);
		tracing::trace!(paragraph = %id, quiet_ms = self.quiet.as_millis() as u64, "debounce.scheduled");
		Observed::Scheduled
	}

	/// Drops the pending timer for `id`, keeping its remembered content.
	pub fn cancel(&mut self, id: &ParagraphId) -> bool {
		match self.timers.remove(id) {
			Some(key) => {
				self.queue.remove(&key);
				true
			}
			None => false,
		}
	}

	/// Forgets `id` entirely. No signal will fire for it.
	pub fn remove(&mut self, id: &ParagraphId) {
		self.cancel(id);
		self.last_seen.remove(id);
	}

	/// Cancels every timer and ignores further observations.
	pub fn shutdown(&mut self) {
		self.queue.clear();
		self.timers.clear();
		self.last_seen.clear();
		self.shut_down = true;
	}

	pub fn is_pending(&self, id: &ParagraphId) -> bool {
		self.timers.contains_key(id)
	}

	pub fn pending(&self) -> usize {
		self.timers.len()
	}

	/// Polls for the next paragraph whose quiet period elapsed.
	///
	/// Stays pending while no timer is armed; callers re-poll after observing.
	pub fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<ParagraphId> {
		match self.queue.poll_expired(cx) {
			Poll::Ready(Some(expired)) => {
				let id = expired.into_inner();
				self.timers.remove(&id);
				tracing::debug!(paragraph = %id, "debounce.ready");
				Poll::Ready(id)
			}
			Poll::Ready(None) | Poll::Pending => Poll::Pending,
		}
	}

	/// Resolves with the next ready paragraph.
	pub async fn next_ready(&mut self) -> ParagraphId {
		poll_fn(|cx| self.poll_ready(cx)).await
	}
}
