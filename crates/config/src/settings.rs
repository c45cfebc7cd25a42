//! The [`Settings`] model and its file/environment layers.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{ConfigError, Result};

#[cfg(test)]
mod tests;

/// Default model identifier for paragraph analysis.
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
/// Default API origin; request paths are appended to it.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
/// Largest accepted `correction_window`. The fuzzy search tries `(2w + 1)^2` offset pairs
/// per span on the session loop.
pub const MAX_CORRECTION_WINDOW: usize = 64;

/// Effective pipeline settings.
#[derive(Clone, PartialEq)]
pub struct Settings {
	/// Reasoning service API key.
	pub api_key: Option<String>,
	pub model: String,
	pub base_url: String,
	pub max_tokens: u32,
	/// Stream responses and publish partial span counts.
	pub stream: bool,
	/// Debounce quiet period before a changed paragraph is analyzed.
	pub quiet_period: Duration,
	/// Half-width of the fuzzy offset search.
	pub correction_window: usize,
	/// Highlight preview length in chars.
	pub preview_chars: usize,
	/// Send the whole document, with the target marked, alongside each paragraph.
	pub document_context: bool,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			api_key: None,
			model: DEFAULT_MODEL.to_string(),
			base_url: DEFAULT_BASE_URL.to_string(),
			max_tokens: 1024,
			stream: true,
			quiet_period: Duration::from_millis(1000),
			correction_window: 5,
			preview_chars: 30,
			document_context: true,
		}
	}
}

impl fmt::Debug for Settings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Settings")
			.field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
			.field("model", &self.model)
			.field("base_url", &self.base_url)
			.field("max_tokens", &self.max_tokens)
			.field("stream", &self.stream)
			.field("quiet_period", &self.quiet_period)
			.field("correction_window", &self.correction_window)
			.field("preview_chars", &self.preview_chars)
			.field("document_context", &self.document_context)
			.finish()
	}
}

/// On-disk form. Every key is optional and unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
	api_key: Option<String>,
	model: Option<String>,
	base_url: Option<String>,
	max_tokens: Option<u32>,
	stream: Option<bool>,
	quiet_ms: Option<u64>,
	correction_window: Option<usize>,
	preview_chars: Option<usize>,
	document_context: Option<bool>,
}

impl Settings {
	/// Parses a TOML settings document over the defaults.
	pub fn parse(input: &str) -> Result<Self> {
		let file: SettingsFile = toml::from_str(input)?;
		let mut settings = Self::default();
		settings.merge_file(file);
		settings.validate()?;
		Ok(settings)
	}

	/// Loads a settings file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Builds the effective settings from every layer.
	///
	/// An explicit `path` must exist; the default location is optional.
	pub fn resolve(path: Option<&Path>) -> Result<Self> {
		let mut settings = match path {
			Some(path) => Self::load(path)?,
			None => match default_path().filter(|p| p.is_file()) {
				Some(path) => {
					tracing::debug!(path = %path.display(), "config.load");
					Self::load(path)?
				}
				None => Self::default(),
			},
		};
		settings.apply_env(|key| std::env::var(key).ok())?;
		Ok(settings)
	}

	/// Applies environment overrides read through `lookup`. Empty values are ignored.
	pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
		let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

		if let Some(key) = var("ANTHROPIC_API_KEY") {
			self.api_key = Some(key);
		}
		if let Some(model) = var("DRAFTER_MODEL") {
			self.model = model;
		}
		if let Some(url) = var("DRAFTER_BASE_URL") {
			self.base_url = url;
		}
		if let Some(ms) = var("DRAFTER_QUIET_MS") {
			let ms = ms.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
				field: "DRAFTER_QUIET_MS",
				message: e.to_string(),
			})?;
			self.quiet_period = Duration::from_millis(ms);
		}
		self.validate()
	}

	/// The configured API key, or [`ConfigError::MissingCredentials`].
	pub fn credentials(&self) -> Result<&str> {
		self.api_key
			.as_deref()
			.map(str::trim)
			.filter(|key| !key.is_empty())
			.ok_or(ConfigError::MissingCredentials)
	}

	fn merge_file(&mut self, file: SettingsFile) {
		if file.api_key.is_some() {
			self.api_key = file.api_key;
		}
		if let Some(model) = file.model {
			self.model = model;
		}
		if let Some(url) = file.base_url {
			self.base_url = url;
		}
		if let Some(max_tokens) = file.max_tokens {
			self.max_tokens = max_tokens;
		}
		if let Some(stream) = file.stream {
			self.stream = stream;
		}
		if let Some(ms) = file.quiet_ms {
			self.quiet_period = Duration::from_millis(ms);
		}
		if let Some(window) = file.correction_window {
			self.correction_window = window;
		}
		if let Some(preview) = file.preview_chars {
			self.preview_chars = preview;
		}
		if let Some(context) = file.document_context {
			self.document_context = context;
		}
	}

	fn validate(&self) -> Result<()> {
		if self.model.trim().is_empty() {
			return Err(invalid("model", "must not be empty"));
		}
		if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
			return Err(invalid("base_url", format!("expected an http(s) URL, got {:?}", self.base_url)));
		}
		if self.max_tokens == 0 {
			return Err(invalid("max_tokens", "must be positive"));
		}
		if self.correction_window > MAX_CORRECTION_WINDOW {
			return Err(invalid(
				"correction_window",
				format!("must be at most {MAX_CORRECTION_WINDOW}, got {}", self.correction_window),
			));
		}
		Ok(())
	}
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
	ConfigError::Invalid {
		field,
		message: message.into(),
	}
}

/// `$XDG_CONFIG_HOME/drafter/config.toml`, when a config directory is known.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("drafter").join("config.toml"))
}
