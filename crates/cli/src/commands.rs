use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use drafter_client::{AnthropicClient, Endpoint, ExplainRequest};
use drafter_config::Settings;
use drafter_pipeline::{PipelineEvent, Session, SessionHandle};
use drafter_primitives::{Highlight, Paragraph};
use drafter_worker::TaskClass;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cli::Target;
use crate::document::{FailureReport, JsonReport, render_document, split_paragraphs};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn apply_overrides(settings: &mut Settings, target: &Target) {
	if let Some(model) = &target.model {
		settings.model = model.clone();
	}
	if target.no_stream {
		settings.stream = false;
	}
}

fn start(client: Arc<AnthropicClient>, settings: Settings) -> (SessionHandle, tokio::task::JoinHandle<()>) {
	let (session, handle) = Session::new(client, Arc::new(settings));
	(handle, session.spawn())
}

/// `drafter analyze`
pub async fn analyze(target: Target, mut settings: Settings, json: bool, explain: bool) -> Result<()> {
	apply_overrides(&mut settings, &target);
	let endpoint = Endpoint::new(&settings.base_url, settings.credentials().context("cannot analyze")?);
	let model = settings.model.clone();

	let text = read_file(&target.file).await?;
	let paragraphs = split_paragraphs(&text);
	tracing::info!(path = %target.file.display(), paragraphs = paragraphs.len(), "analyze.start");

	let client = Arc::new(AnthropicClient::new()?);
	let (handle, task) = start(Arc::clone(&client), settings);
	let mut events = handle.subscribe();

	handle.set_paragraphs(paragraphs.clone()).await?;
	for paragraph in paragraphs.iter().filter(|p| !p.is_blank()) {
		handle
			.analyze_now(paragraph.id.clone())
			.await
			.with_context(|| format!("analyzing {}", paragraph.id))?;
	}
	let view = handle.wait_idle().await?;
	let failures = drain_failures(&mut events);

	handle.shutdown().await;
	task.await.context("analysis session panicked")?;

	if json {
		let report = JsonReport {
			paragraphs: &paragraphs,
			highlights: &view.highlights,
			failures: &failures,
		};
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	print!("{}", render_document(&paragraphs, &view.highlights));
	for failure in &failures {
		eprintln!("{}: {} error: {}", failure.paragraph, failure.kind, failure.message);
	}
	if explain {
		explain_all(&client, &endpoint, &model, &paragraphs, &view.highlights).await?;
	}
	Ok(())
}

fn drain_failures(events: &mut Receiver<PipelineEvent>) -> Vec<FailureReport> {
	let mut failures = Vec::new();
	loop {
		match events.try_recv() {
			Ok(PipelineEvent::Failed { paragraph, kind, message }) => failures.push(FailureReport {
				paragraph: paragraph.to_string(),
				kind: kind.as_str(),
				message,
			}),
			Ok(_) | Err(TryRecvError::Lagged(_)) => {}
			Err(TryRecvError::Empty | TryRecvError::Closed) => return failures,
		}
	}
}

async fn explain_all(
	client: &AnthropicClient,
	endpoint: &Endpoint,
	model: &str,
	paragraphs: &[Paragraph],
	highlights: &[Highlight],
) -> Result<()> {
	for highlight in highlights {
		let Some(paragraph) = paragraphs.iter().find(|p| p.id == highlight.paragraph_id) else {
			continue;
		};
		let request = ExplainRequest {
			context: paragraph.content.clone(),
			span: highlight.full_text.clone(),
			issue_type: highlight.issue_type,
			reasoning: highlight.note.clone(),
		};
		let feedback = client
			.explain_span(endpoint, model, &request, CancellationToken::new())
			.await
			.with_context(|| format!("explaining {}", highlight.id))?;

		println!("\n{} ({}): {}", highlight.id, feedback.severity, feedback.explanation);
		for suggestion in &feedback.suggestions {
			println!("  -> {}", suggestion.text);
			if !suggestion.rationale.is_empty() {
				println!("     {}", suggestion.rationale);
			}
		}
		if !feedback.principle.is_empty() {
			println!("  principle: {}", feedback.principle);
		}
	}
	Ok(())
}

/// `drafter watch`
pub async fn watch(target: Target, mut settings: Settings) -> Result<()> {
	apply_overrides(&mut settings, &target);
	settings.credentials().context("cannot watch")?;

	let client = Arc::new(AnthropicClient::new()?);
	let (handle, task) = start(client, settings);
	let mut view = handle.view();
	let mut events = handle.subscribe();

	let mut poll = tokio::time::interval(POLL_INTERVAL);
	poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	let mut modified: Option<SystemTime> = None;
	let mut paragraphs: Vec<Paragraph> = Vec::new();
	eprintln!("watching {} (Ctrl-C to stop)", target.file.display());

	loop {
		tokio::select! {
			_ = &mut ctrl_c => break,
			_ = poll.tick() => {
				let stamp = modified_time(&target.file).await?;
				if modified != Some(stamp) {
					modified = Some(stamp);
					paragraphs = split_paragraphs(&read_file(&target.file).await?);
					tracing::info!(paragraphs = paragraphs.len(), "watch.reload");
					handle.set_paragraphs(paragraphs.clone()).await?;
				}
			}
			changed = view.changed() => {
				if changed.is_err() {
					break;
				}
				let snapshot = view.borrow_and_update().clone();
				if snapshot.analyzing.is_empty() {
					println!("--- revision {} ---", snapshot.revision);
					print!("{}", render_document(&paragraphs, &snapshot.highlights));
				}
			}
			event = events.recv() => match event {
				Ok(PipelineEvent::Failed { paragraph, kind, message }) => {
					eprintln!("{paragraph}: {} error: {message}", kind.as_str());
				}
				Ok(_) | Err(RecvError::Lagged(_)) => {}
				Err(RecvError::Closed) => break,
			},
		}
	}

	handle.shutdown().await;
	task.await.context("analysis session panicked")?;
	Ok(())
}

/// `drafter models`
pub async fn models(settings: Settings) -> Result<()> {
	let endpoint = Endpoint::new(&settings.base_url, settings.credentials().context("cannot list models")?);
	let client = AnthropicClient::new()?;
	let page = client.list_models(&endpoint).await.context("listing models")?;
	for model in &page.data {
		if model.display_name.is_empty() {
			println!("{}", model.id);
		} else {
			println!("{}\t{}", model.id, model.display_name);
		}
	}
	Ok(())
}

async fn read_file(path: &Path) -> Result<String> {
	let owned: PathBuf = path.to_path_buf();
	drafter_worker::spawn_blocking(TaskClass::FileIo, move || std::fs::read_to_string(&owned))
		.await
		.context("file worker panicked")?
		.with_context(|| format!("reading {}", path.display()))
}

async fn modified_time(path: &Path) -> Result<SystemTime> {
	let owned: PathBuf = path.to_path_buf();
	drafter_worker::spawn_blocking(TaskClass::FileIo, move || std::fs::metadata(&owned).and_then(|m| m.modified()))
		.await
		.context("file worker panicked")?
		.with_context(|| format!("reading metadata of {}", path.display()))
}
