#![allow(unused_crate_dependencies)]

use std::sync::Arc;
use std::time::Duration;

use drafter_client::ErrorKind;
use drafter_client::mock::{MockClient, MockReply};
use drafter_config::{ConfigError, Settings};
use drafter_pipeline::{
	DiscardReason, DispatchError, DispatchOutcome, HighlightView, PipelineEvent, Session, SessionError, SessionHandle,
};
use drafter_primitives::{IssueType, Paragraph, ParagraphId, Priority};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep, timeout};

const CATS: &str = "Cats are better than dogs.";

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn settings() -> Settings {
	Settings {
		api_key: Some("sk-test".into()),
		stream: false,
		..Settings::default()
	}
}

fn whole_sentence_reply() -> MockReply {
	MockReply::spans_json(
		r#"{"spans":[{"text":"Cats are better than dogs.","startOffset":0,"endOffset":27,"type":"factual","priority":"high","confidence":0.9,"reasoning":"Unsupported claim"}]}"#,
	)
}

fn start(mock: &MockClient, settings: Settings) -> SessionHandle {
	init_tracing();
	let (session, handle) = Session::new(Arc::new(mock.clone()), Arc::new(settings));
	session.spawn();
	handle
}

async fn wait_view<F>(handle: &SessionHandle, name: &str, mut condition: F) -> HighlightView
where
	F: FnMut(&HighlightView) -> bool,
{
	let mut view = handle.view();
	timeout(Duration::from_secs(10), async move {
		view.wait_for(|v| condition(v)).await.map(|v| v.clone())
	})
	.await
	.unwrap_or_else(|_| panic!("timed out waiting for {name}"))
	.expect("session is running")
}

async fn wait_event<F>(events: &mut broadcast::Receiver<PipelineEvent>, name: &str, mut matches: F) -> PipelineEvent
where
	F: FnMut(&PipelineEvent) -> bool,
{
	timeout(Duration::from_secs(10), async move {
		loop {
			let event = events.recv().await.expect("event channel open");
			if matches(&event) {
				return event;
			}
		}
	})
	.await
	.unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

/// Runs `p1` through one full debounced analysis of [`CATS`].
async fn analyzed(mock: &MockClient) -> SessionHandle {
	mock.respond_for("p1", whole_sentence_reply());
	let handle = start(mock, settings());
	handle.edit("p1", CATS).await.unwrap();
	wait_view(&handle, "first highlight", |v| v.highlights.len() == 1).await;
	handle
}

#[tokio::test(start_paused = true)]
async fn edit_is_analyzed_once_after_quiet_period() {
	let mock = MockClient::new();
	mock.respond_for("p1", whole_sentence_reply());
	let handle = start(&mock, settings());

	handle.edit("p1", "Cats are").await.unwrap();
	sleep(Duration::from_millis(300)).await;
	handle.edit("p1", CATS).await.unwrap();

	sleep(Duration::from_millis(999)).await;
	assert_eq!(mock.call_count(), 0);

	sleep(Duration::from_millis(2)).await;
	let view = wait_view(&handle, "highlight", |v| v.highlights.len() == 1).await;

	let calls = mock.calls();
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].text, CATS);

	let highlight = &view.highlights[0];
	assert_eq!(highlight.paragraph_id.as_str(), "p1");
	assert_eq!((highlight.start_index, highlight.end_index), (0, 26));
	assert_eq!(highlight.full_text, CATS);
	assert_eq!(highlight.issue_type, IssueType::Factual);
	assert_eq!(highlight.priority, Priority::High);
	assert!(view.analyzing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn edit_while_in_flight_discards_the_result() {
	let mock = MockClient::new();
	let handle = analyzed(&mock).await;
	let mut events = handle.subscribe();

	mock.hold();
	handle.edit("p1", "Cats are clearly better than dogs.").await.unwrap();
	wait_view(&handle, "highlights cleared by edit", |v| v.highlights.is_empty()).await;

	let outcome = handle.analyze_now("p1").await.unwrap();
	assert!(matches!(outcome, DispatchOutcome::Started(_)));
	assert!(handle.snapshot().is_analyzing(&ParagraphId::new("p1")));

	handle.edit("p1", "Cats rule.").await.unwrap();
	let view = wait_view(&handle, "cancel", |v| v.analyzing.is_empty()).await;
	assert!(view.highlights.is_empty());

	mock.release_all();
	let discarded = wait_event(&mut events, "discard", |e| matches!(e, PipelineEvent::Discarded { .. })).await;
	assert_eq!(
		discarded,
		PipelineEvent::Discarded {
			paragraph: "p1".into(),
			reason: DiscardReason::Cancelled,
		}
	);
	assert_eq!(handle.stats().await.unwrap().cancelled, 1);
	assert!(handle.snapshot().highlights.is_empty());
}

#[rstest]
#[case::empty("")]
#[case::whitespace("  \n\t ")]
#[tokio::test(start_paused = true)]
async fn blank_paragraph_clears_immediately(#[case] blank: &str) {
	let mock = MockClient::new();
	let handle = analyzed(&mock).await;
	let started = Instant::now();

	handle.edit("p1", blank).await.unwrap();
	wait_view(&handle, "cleared", |v| v.highlights.is_empty()).await;
	assert!(started.elapsed() < Duration::from_millis(1));

	sleep(Duration::from_secs(3)).await;
	assert_eq!(mock.call_count(), 1);
	assert!(handle.snapshot().highlights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn split_analyzes_prior_paragraph_without_waiting() {
	let mock = MockClient::new();
	mock.respond_for("p1", whole_sentence_reply());
	let handle = start(&mock, settings());
	let started = Instant::now();

	handle.set_paragraphs(vec![Paragraph::new("p1", CATS)]).await.unwrap();
	handle.split("p1", Paragraph::new("p2", "")).await.unwrap();

	let view = wait_view(&handle, "split analysis", |v| v.highlights.len() == 1).await;
	assert!(started.elapsed() < Duration::from_millis(1000));
	assert_eq!(view.highlights[0].paragraph_id.as_str(), "p1");

	sleep(Duration::from_secs(3)).await;
	assert_eq!(mock.calls_for("p1"), 1);
	assert_eq!(mock.calls_for("p2"), 0);
}

#[tokio::test(start_paused = true)]
async fn split_skips_prior_paragraph_already_analyzed() {
	let mock = MockClient::new();
	let handle = analyzed(&mock).await;

	handle.split("p1", Paragraph::new("p2", "Birds are fine.")).await.unwrap();
	sleep(Duration::from_secs(3)).await;

	assert_eq!(mock.calls_for("p1"), 1);
	assert_eq!(mock.calls_for("p2"), 1);
}

#[tokio::test(start_paused = true)]
async fn paragraphs_are_analyzed_in_parallel() {
	let mock = MockClient::new();
	mock.respond_for("p1", whole_sentence_reply()).respond_for(
		"p2",
		MockReply::spans_json(
			r#"{"spans":[{"text":"never","startOffset":5,"endOffset":10,"type":"clarity","priority":"low","confidence":0.6}]}"#,
		),
	);
	mock.hold();
	let handle = start(&mock, settings());

	handle
		.set_paragraphs(vec![Paragraph::new("p1", CATS), Paragraph::new("p2", "Dogs never sleep.")])
		.await
		.unwrap();
	let view = wait_view(&handle, "both analyzing", |v| v.analyzing.len() == 2).await;
	assert_eq!(view.analyzing, vec![ParagraphId::new("p1"), ParagraphId::new("p2")]);
	timeout(Duration::from_secs(1), async {
		while mock.call_count() < 2 {
			sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("both calls in flight");
	assert_eq!(mock.finished_count(), 0);

	mock.release_all();
	let view = wait_view(&handle, "both applied", |v| v.highlights.len() == 2).await;
	let order: Vec<&str> = view.highlights.iter().map(|h| h.paragraph_id.as_str()).collect();
	assert_eq!(order, ["p1", "p2"]);
	assert_eq!(view.highlights[1].full_text, "never");
}

#[tokio::test(start_paused = true)]
async fn deleting_a_paragraph_drops_its_highlights() {
	let mock = MockClient::new();
	let handle = analyzed(&mock).await;
	mock.respond_for(
		"p2",
		MockReply::spans_json(r#"{"spans":[{"text":"Birds","startOffset":0,"endOffset":5,"type":"logic","priority":"medium","confidence":0.7}]}"#),
	);
	handle.split("p1", Paragraph::new("p2", "Birds are fine.")).await.unwrap();
	wait_view(&handle, "two highlights", |v| v.highlights.len() == 2).await;

	handle.delete("p1").await.unwrap();
	let view = wait_view(&handle, "p1 removed", |v| v.highlights.len() == 1).await;
	assert_eq!(view.highlights[0].paragraph_id.as_str(), "p2");
}

#[tokio::test(start_paused = true)]
async fn missing_credentials_are_reported_without_calling() {
	let mock = MockClient::new();
	let handle = start(&mock, Settings::default());
	let mut events = handle.subscribe();

	handle.edit("p1", CATS).await.unwrap();
	let err = handle.analyze_now("p1").await.unwrap_err();
	assert!(matches!(
		err,
		SessionError::Dispatch(DispatchError::Config(ConfigError::MissingCredentials))
	));

	let failed = wait_event(&mut events, "failure", |e| matches!(e, PipelineEvent::Failed { .. })).await;
	assert!(matches!(
		failed,
		PipelineEvent::Failed {
			kind: ErrorKind::Configuration,
			..
		}
	));
	assert_eq!(mock.call_count(), 0);
	assert!(handle.snapshot().analyzing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn editing_clears_selection_in_that_paragraph() {
	let mock = MockClient::new();
	let handle = analyzed(&mock).await;

	let id = handle.snapshot().highlights[0].id.clone();
	handle.select(Some(id.clone())).await.unwrap();
	let view = wait_view(&handle, "selection", |v| v.selected.is_some()).await;
	assert_eq!(view.selected_highlight().map(|h| &h.id), Some(&id));

	handle.edit("p1", "Cats are best.").await.unwrap();
	let view = wait_view(&handle, "selection cleared", |v| v.selected.is_none()).await;
	assert!(view.highlights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_running_analysis() {
	let mock = MockClient::new();
	mock.hold();
	let handle = start(&mock, settings());

	handle.edit("p1", CATS).await.unwrap();
	handle.analyze_now("p1").await.unwrap();
	handle.shutdown().await;

	wait_view(&handle, "idle", |v| v.analyzing.is_empty()).await;
	mock.release_all();
	sleep(Duration::from_millis(10)).await;
	assert_eq!(mock.finished_count(), 0);
	assert!(matches!(handle.edit("p1", "x").await, Err(SessionError::Closed)));
}
