use std::collections::HashMap;
use std::io::Write;

use pretty_assertions::assert_eq;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
	let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
	move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_documented_values() {
	let settings = Settings::default();
	assert_eq!(settings.model, "claude-3-5-haiku-20241022");
	assert_eq!(settings.base_url, "https://api.anthropic.com");
	assert_eq!(settings.max_tokens, 1024);
	assert!(settings.stream);
	assert_eq!(settings.quiet_period, Duration::from_millis(1000));
	assert_eq!(settings.correction_window, 5);
	assert_eq!(settings.preview_chars, 30);
	assert!(settings.document_context);
	assert!(settings.api_key.is_none());
}

#[test]
fn file_values_override_defaults() {
	let settings = Settings::parse(
		r#"
		model = "claude-sonnet-4-20250514"
		quiet_ms = 250
		correction_window = 8
		stream = false
		"#,
	)
	.unwrap();
	assert_eq!(settings.model, "claude-sonnet-4-20250514");
	assert_eq!(settings.quiet_period, Duration::from_millis(250));
	assert_eq!(settings.correction_window, 8);
	assert!(!settings.stream);
	assert_eq!(settings.preview_chars, 30);
}

#[test]
fn unknown_keys_are_rejected() {
	let err = Settings::parse("modle = \"x\"").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn invalid_values_are_rejected() {
	let err = Settings::parse("max_tokens = 0").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "max_tokens", .. }), "{err}");
	let err = Settings::parse("base_url = \"api.anthropic.com\"").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "base_url", .. }), "{err}");
}

#[test]
fn correction_window_is_capped() {
	let settings = Settings::parse("correction_window = 64").unwrap();
	assert_eq!(settings.correction_window, MAX_CORRECTION_WINDOW);

	let err = Settings::parse("correction_window = 65").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "correction_window", .. }), "{err}");
	let err = Settings::parse("correction_window = 9223372036854775807").unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "correction_window", .. }), "{err}");
}

#[test]
fn environment_overrides_file() {
	let mut settings = Settings::parse("model = \"from-file\"\napi_key = \"file-key\"").unwrap();
	settings
		.apply_env(env(&[
			("ANTHROPIC_API_KEY", "env-key"),
			("DRAFTER_MODEL", "from-env"),
			("DRAFTER_QUIET_MS", "40"),
			("DRAFTER_BASE_URL", ""),
		]))
		.unwrap();
	assert_eq!(settings.api_key.as_deref(), Some("env-key"));
	assert_eq!(settings.model, "from-env");
	assert_eq!(settings.quiet_period, Duration::from_millis(40));
	assert_eq!(settings.base_url, DEFAULT_BASE_URL);
}

#[test]
fn malformed_quiet_period_is_reported() {
	let err = Settings::default().apply_env(env(&[("DRAFTER_QUIET_MS", "soon")])).unwrap_err();
	assert!(matches!(err, ConfigError::Invalid { field: "DRAFTER_QUIET_MS", .. }));
}

#[test]
fn credentials_require_non_blank_key() {
	let mut settings = Settings::default();
	assert!(matches!(settings.credentials(), Err(ConfigError::MissingCredentials)));
	settings.api_key = Some("   ".into());
	assert!(matches!(settings.credentials(), Err(ConfigError::MissingCredentials)));
	settings.api_key = Some(" sk-test ".into());
	assert_eq!(settings.credentials().unwrap(), "sk-test");
}

#[test]
fn debug_output_redacts_key() {
	let settings = Settings {
		api_key: Some("sk-secret".into()),
		..Settings::default()
	};
	let rendered = format!("{settings:?}");
	assert!(!rendered.contains("sk-secret"));
	assert!(rendered.contains("<redacted>"));
}

#[test]
fn load_reads_file_and_reports_missing_path() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "preview_chars = 12").unwrap();
	assert_eq!(Settings::load(file.path()).unwrap().preview_chars, 12);

	let dir = tempfile::tempdir().unwrap();
	let missing = dir.path().join("absent.toml");
	let err = Settings::load(&missing).unwrap_err();
	assert!(matches!(err, ConfigError::Io { ref path, .. } if path == &missing));
	assert!(Settings::resolve(Some(missing.as_path())).is_err());
}
