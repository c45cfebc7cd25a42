use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "drafter")]
#[command(about = "Paragraph-level writing feedback from a reasoning service")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Settings file (defaults to the user config directory)
	#[arg(long, short = 'c', global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Analyze every paragraph of a file once and print the feedback
	Analyze {
		#[command(flatten)]
		target: Target,

		/// Print highlights as JSON
		#[arg(long)]
		json: bool,

		/// Request a detailed explanation for every highlight
		#[arg(long, conflicts_with = "json")]
		explain: bool,
	},
	/// Re-analyze a file whenever it changes, until interrupted
	Watch {
		#[command(flatten)]
		target: Target,
	},
	/// List models available to the configured key
	Models,
}

/// File and per-run overrides shared by the analysis commands.
#[derive(Args, Debug)]
pub struct Target {
	/// Text file to analyze; paragraphs are separated by blank lines
	pub file: PathBuf,

	/// Model id, overriding the settings file
	#[arg(long, short = 'm')]
	pub model: Option<String>,

	/// Wait for the full response instead of streaming it
	#[arg(long)]
	pub no_stream: bool,
}
