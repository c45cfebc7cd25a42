//! Live settings access for long-running pipelines.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::Settings;

/// Supplies the settings in effect right now.
///
/// Implementations must be cheap to call; the dispatcher calls [`current`](Self::current)
/// once per analysis.
pub trait SettingsSource: Send + Sync {
	fn current(&self) -> Settings;
}

impl SettingsSource for Settings {
	fn current(&self) -> Settings {
		self.clone()
	}
}

impl<T: SettingsSource + ?Sized> SettingsSource for Arc<T> {
	fn current(&self) -> Settings {
		(**self).current()
	}
}

/// Settings shared between the pipeline and whatever edits them.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
	inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
	pub fn new(settings: Settings) -> Self {
		Self {
			inner: Arc::new(RwLock::new(settings)),
		}
	}

	/// Mutates the settings in place; the next [`current`](SettingsSource::current) sees the change.
	pub fn update(&self, f: impl FnOnce(&mut Settings)) {
		f(&mut self.inner.write());
		tracing::debug!(model = %self.inner.read().model, "config.updated");
	}

	pub fn replace(&self, settings: Settings) {
		*self.inner.write() = settings;
	}
}

impl SettingsSource for SharedSettings {
	fn current(&self) -> Settings {
		self.inner.read().clone()
	}
}
