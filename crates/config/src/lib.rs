//! Settings for the drafter pipeline.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. `$XDG_CONFIG_HOME/drafter/config.toml` (or an explicit path)
//! 3. Environment variables (`ANTHROPIC_API_KEY`, `DRAFTER_MODEL`, `DRAFTER_BASE_URL`, `DRAFTER_QUIET_MS`)
//!
//! ```toml
//! api_key = "sk-ant-..."
//! model = "claude-3-5-haiku-20241022"
//! quiet_ms = 1000
//! correction_window = 5
//! document_context = true
//! ```
//!
//! The pipeline never caches a [`Settings`] value: it asks a [`SettingsSource`]
//! on every dispatch so credential or model changes apply to the next call.

pub mod error;
pub mod settings;
pub mod source;

pub use error::{ConfigError, Result};
pub use settings::{MAX_CORRECTION_WINDOW, Settings, default_path};
pub use source::{SettingsSource, SharedSettings};
