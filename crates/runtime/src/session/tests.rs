use std::time::Duration;

use webdrive_protocol::ReaderLimits;

use super::*;
use crate::testing::{Call, ScriptedEngine, SharedOutput};

fn start() -> (Arc<ScriptedEngine>, Session, SharedOutput) {
	let engine = ScriptedEngine::new();
	let output = SharedOutput::default();
	let session = Session::start(engine.clone(), Box::new(output.clone())).unwrap();
	(engine, session, output)
}

#[tokio::test]
async fn test_start_creates_browser_and_waits_for_ready() {
	let (engine, session, output) = start();
	assert_eq!(engine.calls(), vec![Call::CreateBrowser]);
	assert_eq!(session.context().state(), BrowserState::AwaitingReady);

	let early = tokio::time::timeout(Duration::from_millis(20), session.wait_until_ready()).await;
	assert!(early.is_err());
	assert_eq!(output.text(), "");

	engine.run_pending();
	session.wait_until_ready().await.unwrap();
	assert_eq!(session.context().state(), BrowserState::Ready);
	assert_eq!(output.text(), "Ready\n");
}

#[tokio::test]
async fn test_eof_closes_browser_and_quits_once() {
	let (engine, session, output) = start();
	engine.run_pending();

	let summary = session
		.read_commands(&b""[..], ReaderLimits::default())
		.await
		.unwrap();
	assert!(matches!(summary.end, ReadEnd::EndOfInput));
	assert_eq!(summary.dispatched, 0);

	engine.run_pending();
	assert_eq!(
		engine.calls(),
		vec![
			Call::CreateBrowser,
			Call::CloseBrowser { force: true },
			Call::QuitRunLoop
		]
	);
	assert_eq!(session.context().state(), BrowserState::Closed);
	assert!(session.context().quit_requested());
	assert!(session.context().browser().is_none());
	assert!(!engine.holds_handlers());
	assert_eq!(output.text(), "Ready\n");

	session.request_close();
	let quits = engine
		.calls()
		.into_iter()
		.filter(|call| *call == Call::QuitRunLoop)
		.count();
	assert_eq!(quits, 1);
}

#[tokio::test]
async fn test_short_block_aborts_without_response() {
	let (engine, session, output) = start();
	engine.run_pending();

	let summary = session
		.read_commands(&b"Visit\n1\n10\nabc"[..], ReaderLimits::default())
		.await
		.unwrap();
	assert!(matches!(
		summary.end,
		ReadEnd::Aborted(ReadError::Truncated {
			expected: 10,
			received: 3
		})
	));
	assert_eq!(summary.dispatched, 0);

	engine.run_pending();
	assert_eq!(output.text(), "Ready\n");
	assert!(!engine.calls().iter().any(|call| matches!(call, Call::Navigate(_))));
	assert!(engine.calls().contains(&Call::QuitRunLoop));
}

#[tokio::test]
async fn test_unknown_commands_are_counted_as_ignored() {
	let (engine, session, output) = start();
	engine.run_pending();

	let summary = session
		.read_commands(&b"Frob\n1\n1\nxFrob\n0\n"[..], ReaderLimits::default())
		.await
		.unwrap();
	assert_eq!(summary.dispatched, 0);
	assert_eq!(summary.ignored, 2);

	engine.run_pending();
	assert_eq!(output.text(), "Ready\n");
}

#[tokio::test]
async fn test_close_proceeds_after_drain_timeout() {
	let (engine, session, output) = start();
	let session = session.with_drain_timeout(Duration::from_millis(20));
	engine.run_pending();

	let summary = session
		.read_commands(&b"Visit\n1\n11\nabout:blank"[..], ReaderLimits::default())
		.await
		.unwrap();
	assert_eq!(summary.dispatched, 1);
	assert_eq!(session.context().outstanding_responses(), 1);

	engine.run_pending();
	assert_eq!(output.text(), "Ready\nok\n0\n");
	assert_eq!(
		engine.calls(),
		vec![
			Call::CreateBrowser,
			Call::Navigate("about:blank".into()),
			Call::CloseBrowser { force: true },
			Call::QuitRunLoop
		]
	);
}

#[tokio::test]
async fn test_dropping_session_mid_close_still_quits() {
	let (engine, session, _output) = start();
	engine.run_pending();

	session.request_close();
	drop(session);
	engine.run_pending();

	let calls = engine.calls();
	assert_eq!(calls.first(), Some(&Call::CreateBrowser));
	assert!(calls.contains(&Call::CloseBrowser { force: true }));
	assert_eq!(
		calls.iter().filter(|call| **call == Call::QuitRunLoop).count(),
		1
	);
}
