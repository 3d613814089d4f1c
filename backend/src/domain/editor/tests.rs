//! Behavioural tests for the editor session.
//!
//! Timing tests run on a paused tokio clock so the 500 ms quiet window is
//! deterministic.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::domain::error::Error;
use crate::domain::ports::{
    CodeSink, ExecutionBackend, ExecutionError, ExecutionOutcome, ExecutionRequest,
};
use crate::domain::project::{Language, Project, ProjectId, ProjectName};
use crate::domain::user::UserId;

#[derive(Default)]
struct RecordingSink {
    saves: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    fn failing() -> Self {
        Self {
            saves: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn saves(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CodeSink for RecordingSink {
    async fn persist(&self, _project: &ProjectId, code: &str) -> Result<(), Error> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code.to_owned());
        if self.fail {
            Err(Error::internal("sink unavailable"))
        } else {
            Ok(())
        }
    }
}

/// Sink whose writes take a while, so a teardown can land mid-persist.
struct SlowSink {
    delay: Duration,
    saves: Mutex<Vec<String>>,
}

impl SlowSink {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            saves: Mutex::new(Vec::new()),
        }
    }

    fn saves(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CodeSink for SlowSink {
    async fn persist(&self, _project: &ProjectId, code: &str) -> Result<(), Error> {
        tokio::time::sleep(self.delay).await;
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code.to_owned());
        Ok(())
    }
}

struct StubExecutor {
    result: Result<ExecutionOutcome, ExecutionError>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl StubExecutor {
    fn ok(stdout: &str, stderr: &str) -> Self {
        Self {
            result: Ok(ExecutionOutcome {
                stdout: stdout.to_owned(),
                stderr: stderr.to_owned(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(ExecutionError::transport("connection refused")),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ExecutionBackend for StubExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.result.clone()
    }
}

fn fixture_project(code: &str) -> Project {
    let mut project = Project::seeded(
        ProjectName::new("Main").expect("valid name"),
        Language::Python,
        UserId::random(),
    );
    project.code = code.to_owned();
    project
}

struct Fixture {
    sink: Arc<RecordingSink>,
    executor: Arc<StubExecutor>,
    registry: Arc<SuggestionRegistry>,
}

impl Fixture {
    fn new(sink: RecordingSink, executor: StubExecutor) -> Self {
        Self {
            sink: Arc::new(sink),
            executor: Arc::new(executor),
            registry: Arc::new(SuggestionRegistry::default()),
        }
    }

    fn open(&self, code: &str) -> EditorSession {
        EditorSession::open(
            &fixture_project(code),
            Arc::clone(&self.sink) as Arc<dyn CodeSink>,
            Arc::clone(&self.executor) as Arc<dyn ExecutionBackend>,
            Arc::clone(&self.registry),
        )
    }
}

async fn settle() {
    // Let aborted/fired timer tasks run to completion.
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_mutations_coalesce_into_one_save() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("print(1)");

    session.edit("let alpha = 1").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.edit("let alpha = 12").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.edit("let alpha = 123").await;

    assert!(fx.sink.saves().is_empty(), "no save inside the quiet window");
    assert!(session.has_pending_save());

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    assert_eq!(fx.sink.saves(), vec!["let alpha = 123"]);
    assert!(!session.has_pending_save());
    assert!(!session.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn each_mutation_restarts_the_window() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("");

    // Keep editing every 400 ms; the 500 ms window never elapses.
    for step in 0..4 {
        session.edit(&format!("buffer v{step}")).await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(fx.sink.saves().is_empty());
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    settle().await;
    assert_eq!(fx.sink.saves(), vec!["buffer v3"]);
}

#[tokio::test(start_paused = true)]
async fn empty_buffer_saves_immediately() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("print(1)");

    session.edit("").await;

    assert_eq!(fx.sink.saves(), vec![""], "empty save bypasses the debounce");
    assert!(!session.has_pending_save());
    assert_eq!(fx.registry.active_count(), 0, "registration disposed");
}

#[tokio::test(start_paused = true)]
async fn empty_save_supersedes_a_pending_write() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("");

    session.edit("about to vanish").await;
    session.edit("").await;

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    // Only the empty save fired; the debounced payload was superseded.
    assert_eq!(fx.sink.saves(), vec![""]);
}

#[tokio::test(start_paused = true)]
async fn close_flushes_the_pending_write() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("");

    session.edit("almost lost").await;
    session.close().await;

    assert_eq!(fx.sink.saves(), vec!["almost lost"]);
}

#[tokio::test(start_paused = true)]
async fn close_without_pending_writes_nothing() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let session = fx.open("print(1)");
    session.close().await;
    assert!(fx.sink.saves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn close_during_an_in_flight_save_still_persists() {
    let sink = Arc::new(SlowSink::new(Duration::from_secs(3)));
    let registry = Arc::new(SuggestionRegistry::default());
    let mut session = EditorSession::open(
        &fixture_project("print(1)"),
        Arc::clone(&sink) as Arc<dyn CodeSink>,
        Arc::new(StubExecutor::ok("", "")) as Arc<dyn ExecutionBackend>,
        registry,
    );

    session.edit("final edit").await;
    // Let the quiet window elapse so the debounced write is mid-persist.
    tokio::time::sleep(Duration::from_millis(550)).await;
    session.close().await;

    assert_eq!(sink.saves(), vec!["final edit"]);
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_the_buffer_and_does_not_retry() {
    let fx = Fixture::new(RecordingSink::failing(), StubExecutor::ok("", ""));
    let mut session = fx.open("");

    session.edit("unpersisted state").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;

    assert_eq!(fx.sink.saves(), vec!["unpersisted state"]);
    assert_eq!(session.buffer(), "unpersisted state", "no rollback");
    assert!(session.is_dirty(), "dirty until a save succeeds");

    // No retry: nothing further happens without a new mutation.
    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(fx.sink.saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn suggestions_track_the_latest_buffer_with_one_registration() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let mut session = fx.open("first_var = 1");

    assert_eq!(
        fx.registry.suggestions_for(&Language::Python),
        vec!["first_var"]
    );

    session.edit("second_var = 2").await;
    session.edit("third_var = second_var").await;

    assert_eq!(fx.registry.active_count(), 1, "exactly one live registration");
    assert_eq!(
        fx.registry.suggestions_for(&Language::Python),
        vec!["third_var", "second_var"]
    );
}

#[tokio::test(start_paused = true)]
async fn run_sends_buffer_language_and_version() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("hi\n", ""));
    let mut session = fx.open("print('hi')");
    session.set_runtime_version("3.12.0");

    let display = session.run().await.expect("run succeeds");

    assert_eq!(display.text, "hi");
    assert!(!display.is_error);
    let requests = fx.executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].language, Language::Python);
    assert_eq!(requests[0].version, "3.12.0");
    assert_eq!(requests[0].file_name, "Main.py");
    assert_eq!(requests[0].content, "print('hi')");
    assert!(!session.is_running());
}

#[tokio::test(start_paused = true)]
async fn run_prefers_cleaned_stderr() {
    let stderr = "/usr/src/Main.py:3:1: NameError: name 'x' is not defined\n";
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("ignored", stderr));
    let mut session = fx.open("x");

    let display = session.run().await.expect("run succeeds");

    assert!(display.is_error);
    assert_eq!(display.text, "NameError: name 'x' is not defined");
}

#[tokio::test(start_paused = true)]
async fn run_with_no_output_shows_placeholder() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("  \n", ""));
    let mut session = fx.open("pass");

    let display = session.run().await.expect("run succeeds");

    assert_eq!(display.text, NO_OUTPUT_PLACEHOLDER);
    assert!(!display.is_error);
}

#[tokio::test(start_paused = true)]
async fn run_transport_failure_shows_generic_message() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::failing());
    let mut session = fx.open("print(1)");

    let display = session.run().await.expect("failure is displayed, not raised");

    assert!(display.is_error);
    assert_eq!(display.text, "execution failed; check the code or try again");
}

#[test]
fn stderr_prefix_stripping_handles_multiple_lines() {
    let stderr = "Main.java:4: error: ';' expected\n/tmp/job/Main.java:9:2: warning: unchecked";
    let cleaned = super::strip_diagnostic_prefixes(stderr);
    assert_eq!(cleaned, "error: ';' expected\nwarning: unchecked");
}

#[tokio::test(start_paused = true)]
async fn buffer_is_trimmed_on_open() {
    let fx = Fixture::new(RecordingSink::default(), StubExecutor::ok("", ""));
    let session = fx.open("  print(1)\n\n");
    assert_eq!(session.buffer(), "print(1)");
    session.close().await;
}
