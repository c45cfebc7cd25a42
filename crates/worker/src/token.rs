use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Identifier of one spawned analysis, unique within its [`TaskClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Monotonic task id source. Clones share the counter.
#[derive(Debug, Default, Clone)]
pub struct TaskClock {
	next: Arc<AtomicU64>,
}

impl TaskClock {
	/// Creates a clock whose first id is 1.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn next(&self) -> TaskId {
		TaskId(self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
	}
}

/// Cancellation handle scoped to one task id.
///
/// Tokens form a tree: cancelling a token cancels every [`child`](Self::child)
/// and [`derive`](Self::derive)d token beneath it, never its parent.
#[derive(Debug, Clone)]
pub struct TaskToken {
	id: TaskId,
	cancel: CancellationToken,
}

impl TaskToken {
	pub fn new(id: TaskId, cancel: CancellationToken) -> Self {
		Self { id, cancel }
	}

	pub const fn id(&self) -> TaskId {
		self.id
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Resolves once cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Child token with the same id.
	pub fn child(&self) -> Self {
		Self {
			id: self.id,
			cancel: self.cancel.child_token(),
		}
	}

	/// Token for a new task beneath this one.
	pub fn derive(&self, id: TaskId) -> Self {
		Self {
			id,
			cancel: self.cancel.child_token(),
		}
	}

	/// Raw token for APIs that take a plain [`CancellationToken`].
	pub fn cancellation(&self) -> CancellationToken {
		self.cancel.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clock_starts_at_one_and_is_shared() {
		let clock = TaskClock::new();
		let other = clock.clone();
		assert_eq!(clock.next().get(), 1);
		assert_eq!(other.next().get(), 2);
		assert_eq!(clock.next().to_string(), "#3");
	}

	#[test]
	fn cancellation_flows_down_only() {
		let clock = TaskClock::new();
		let root = TaskToken::new(clock.next(), CancellationToken::new());
		let task = root.derive(clock.next());
		let call = task.child();

		call.cancel();
		assert!(call.is_cancelled());
		assert!(!task.is_cancelled());

		let sibling = root.derive(clock.next());
		root.cancel();
		assert!(task.is_cancelled());
		assert!(sibling.is_cancelled());
		assert!(sibling.cancellation().is_cancelled());
	}

	#[tokio::test]
	async fn cancelled_resolves_after_cancel() {
		let token = TaskToken::new(TaskClock::new().next(), CancellationToken::new());
		let waiter = token.clone();
		let handle = tokio::spawn(async move { waiter.cancelled().await });
		token.cancel();
		handle.await.unwrap();
	}
}
