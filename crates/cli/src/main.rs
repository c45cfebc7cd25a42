//! `drafter` command-line tool.

mod cli;
mod commands;
mod document;

use std::path::PathBuf;

use clap::Parser;
use cli::{Cli, Command};
use drafter_config::Settings;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let settings = Settings::resolve(cli.config.as_deref())?;
	info!(model = %settings.model, "starting drafter");

	match cli.command {
		Command::Analyze { target, json, explain } => commands::analyze(target, settings, json, explain).await,
		Command::Watch { target } => commands::watch(target, settings).await,
		Command::Models => commands::models(settings).await,
	}
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("DRAFTER_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("drafter=debug,drafter_pipeline=debug,drafter_client=debug,warn")
				} else {
					EnvFilter::new("warn")
				}
			})
	};

	if let Some(log_dir) = std::env::var("DRAFTER_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("drafter.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
