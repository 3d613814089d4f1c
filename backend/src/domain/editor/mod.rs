//! Editor session: one client-held code buffer and its disciplines.
//!
//! The session assumes it is the sole mutator of its project's code for its
//! lifetime (single logical writer per project per tab). It performs no
//! locking and no merge: a second concurrent session on the same project
//! overwrites with last-write-wins semantics.

mod autosave;
mod suggest;

pub use autosave::{Autosave, QUIET_WINDOW};
pub use suggest::{extract_candidates, SuggestionRegistration, SuggestionRegistry};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use super::error::Error;
use super::ports::{CodeSink, ExecutionBackend, ExecutionRequest};
use super::project::{Language, Project, ProjectId};

/// Placeholder shown when a run produced neither stdout nor stderr.
pub const NO_OUTPUT_PLACEHOLDER: &str = "no output";

/// Message shown when the execution transport failed.
const EXECUTION_FAILED_MESSAGE: &str = "execution failed; check the code or try again";

/// Default runtime version selector: latest available.
const DEFAULT_RUNTIME_VERSION: &str = "*";

/// Shared dirty marker for the buffer; cleared by a successful save.
#[derive(Clone, Default)]
pub struct DirtyFlag(Arc<AtomicBool>);

impl DirtyFlag {
    fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the buffer has mutations not yet confirmed persisted.
    pub fn is_dirty(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What the output pane should display after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDisplay {
    pub text: String,
    pub is_error: bool,
}

/// Client-held editing session for one project.
pub struct EditorSession {
    project: ProjectId,
    language: Language,
    file_name: String,
    runtime_version: String,
    buffer: String,
    dirty: DirtyFlag,
    autosave: Autosave,
    registry: Arc<SuggestionRegistry>,
    registration: Option<SuggestionRegistration>,
    executor: Arc<dyn ExecutionBackend>,
    running: bool,
}

impl EditorSession {
    /// Open a session on a loaded project.
    ///
    /// The stored code is trimmed on load and the initial suggestion set is
    /// published immediately.
    pub fn open(
        project: &Project,
        sink: Arc<dyn CodeSink>,
        executor: Arc<dyn ExecutionBackend>,
        registry: Arc<SuggestionRegistry>,
    ) -> Self {
        Self::open_with_delay(project, sink, executor, registry, QUIET_WINDOW)
    }

    /// Open a session with an explicit debounce window (tests shrink it).
    pub fn open_with_delay(
        project: &Project,
        sink: Arc<dyn CodeSink>,
        executor: Arc<dyn ExecutionBackend>,
        registry: Arc<SuggestionRegistry>,
        delay: Duration,
    ) -> Self {
        let dirty = DirtyFlag::default();
        let buffer = project.code.trim().to_owned();
        let mut session = Self {
            project: project.id,
            language: project.language.clone(),
            file_name: project.file_name(),
            runtime_version: DEFAULT_RUNTIME_VERSION.to_owned(),
            buffer,
            dirty: dirty.clone(),
            autosave: Autosave::with_delay(sink, project.id, dirty, delay),
            registry,
            registration: None,
            executor,
            running: false,
        };
        session.publish_suggestions();
        session
    }

    /// Pin the runtime version sent with execution requests.
    pub fn set_runtime_version(&mut self, version: impl Into<String>) {
        self.runtime_version = version.into();
    }

    /// Apply one buffer mutation.
    ///
    /// Non-empty buffers are persisted through the trailing-edge debounce;
    /// an empty buffer is persisted immediately and its suggestion
    /// registration disposed.
    pub async fn edit(&mut self, code: &str) {
        self.buffer = code.to_owned();

        if self.buffer.trim().is_empty() {
            if let Some(registration) = self.registration.take() {
                registration.dispose();
            }
            self.autosave.save_now("").await;
            return;
        }

        self.autosave.schedule(self.buffer.clone());
        self.publish_suggestions();
    }

    /// Tear the session down, flushing any pending debounced write.
    pub async fn close(mut self) {
        self.autosave.flush().await;
    }

    /// Run the current buffer on the execution backend.
    ///
    /// Non-reentrant: a second call while one is outstanding fails with
    /// `InvalidRequest`. The guard is UI backpressure only; it does not
    /// abort the in-flight request.
    pub async fn run(&mut self) -> Result<RunDisplay, Error> {
        if self.running {
            return Err(Error::invalid_request("a run is already in progress"));
        }
        self.running = true;

        let request = ExecutionRequest {
            language: self.language.clone(),
            version: self.runtime_version.clone(),
            file_name: self.file_name.clone(),
            content: self.buffer.clone(),
        };
        let result = self.executor.execute(&request).await;
        self.running = false;

        Ok(match result {
            Ok(outcome) => {
                let stderr = outcome.stderr.trim();
                let stdout = outcome.stdout.trim();
                if !stderr.is_empty() {
                    RunDisplay {
                        text: strip_diagnostic_prefixes(stderr),
                        is_error: true,
                    }
                } else if !stdout.is_empty() {
                    RunDisplay {
                        text: stdout.to_owned(),
                        is_error: false,
                    }
                } else {
                    RunDisplay {
                        text: NO_OUTPUT_PLACEHOLDER.to_owned(),
                        is_error: false,
                    }
                }
            }
            Err(error) => {
                warn!(project = %self.project, %error, "run failed");
                RunDisplay {
                    text: EXECUTION_FAILED_MESSAGE.to_owned(),
                    is_error: true,
                }
            }
        })
    }

    /// Current buffer contents.
    pub fn buffer(&self) -> &str {
        self.buffer.as_str()
    }

    /// Whether the buffer has unpersisted mutations.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Whether a run is outstanding.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Language mode of the buffer.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Whether a debounced write is waiting for its quiet window.
    pub fn has_pending_save(&self) -> bool {
        self.autosave.has_pending()
    }

    fn publish_suggestions(&mut self) {
        let candidates = extract_candidates(&self.buffer);
        // Dispose before installing: at most one live registration.
        if let Some(previous) = self.registration.take() {
            previous.dispose();
        }
        self.registration = Some(self.registry.register(self.language.clone(), candidates));
    }
}

static DIAGNOSTIC_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn diagnostic_prefix_regex() -> &'static Regex {
    DIAGNOSTIC_PREFIX_RE.get_or_init(|| {
        // Leading `path:line:col:` noise emitted by compilers and interpreters.
        #[expect(clippy::expect_used, reason = "the pattern is a valid literal")]
        Regex::new(r"^(/?[\w\-.\\/]+):?\d*:?\d*:?\s*").expect("diagnostic pattern is valid")
    })
}

/// Strip per-line `path:line:col:` prefixes from stderr before display.
fn strip_diagnostic_prefixes(stderr: &str) -> String {
    stderr
        .lines()
        .map(|line| diagnostic_prefix_regex().replace(line, "").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests;
