//! Incremental paragraph analysis.
//!
//! Edits flow through a [`Session`]:
//!
//! 1. [`ParagraphStore`] records the new content.
//! 2. [`DebounceScheduler`] restarts the paragraph's quiet-period timer.
//! 3. When the timer fires, [`Dispatcher`] starts a cancellable analysis unless
//!    the content is blank, unchanged since the last analysis, or already in flight.
//! 4. The result is validated, resolved, and installed in the
//!    [`HighlightCollection`] only if the paragraph still holds the analyzed text.
//!
//! Consumers observe [`HighlightView`] snapshots and [`PipelineEvent`]s through a
//! [`SessionHandle`].

#![cfg_attr(test, allow(unused_crate_dependencies))]

mod collection;
mod debounce;
mod dispatcher;
mod error;
mod event;
mod report;
mod session;
mod store;
mod task;

pub use collection::{HighlightCollection, Removal};
pub use debounce::{DEFAULT_QUIET_PERIOD, DebounceScheduler, Observed};
pub use dispatcher::{Completion, DispatchOutcome, Dispatcher, Invalidation};
pub use error::{DispatchError, Result, SessionError};
pub use event::{DiscardReason, HighlightView, PipelineEvent};
pub use report::{DispatchStats, FailureReporter, TracingReporter};
pub use session::{Session, SessionHandle};
pub use store::{ContentChange, ParagraphStore};
pub use task::{TaskMessage, TaskMessageKind, Trigger};
