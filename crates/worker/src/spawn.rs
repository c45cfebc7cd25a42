use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::TaskClass;

/// Runtime for analysis work started outside any tokio context.
///
/// The `drafter` binary and the session always run inside a runtime, so this is only
/// reached when an embedding editor drives a session from a plain UI thread. Two
/// workers are plenty: analysis tasks spend their time waiting on the network.
fn detached_runtime() -> &'static Runtime {
	static DETACHED: OnceLock<Runtime> = OnceLock::new();
	DETACHED.get_or_init(|| {
		Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("drafter-analysis")
			.build()
			.expect("cannot start detached analysis runtime")
	})
}

fn runtime_handle() -> Handle {
	Handle::try_current().unwrap_or_else(|_| detached_runtime().handle().clone())
}

/// Spawns an async task labelled with `class`.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Runs blocking work on the runtime's blocking pool.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
