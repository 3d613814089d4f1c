//! Trailing-edge debounced persistence of the editor buffer.
//!
//! Every mutation replaces the pending payload and restarts the quiet-window
//! timer; only the final buffer within the window reaches the [`CodeSink`].
//! Scheduling supersedes any not-yet-fired timer, so at most one pending
//! flush exists at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::domain::ports::CodeSink;
use crate::domain::project::ProjectId;

use super::DirtyFlag;

/// Quiet window after the last mutation before a write fires.
pub const QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Debounced writer for one project's code buffer.
pub struct Autosave {
    sink: Arc<dyn CodeSink>,
    project: ProjectId,
    delay: Duration,
    pending: Arc<Mutex<Option<String>>>,
    dirty: DirtyFlag,
    timer: Option<JoinHandle<()>>,
}

impl Autosave {
    /// Build a writer with the standard quiet window.
    pub fn new(sink: Arc<dyn CodeSink>, project: ProjectId, dirty: DirtyFlag) -> Self {
        Self::with_delay(sink, project, dirty, QUIET_WINDOW)
    }

    /// Build a writer with an explicit quiet window.
    pub fn with_delay(
        sink: Arc<dyn CodeSink>,
        project: ProjectId,
        dirty: DirtyFlag,
        delay: Duration,
    ) -> Self {
        Self {
            sink,
            project,
            delay,
            pending: Arc::new(Mutex::new(None)),
            dirty,
            timer: None,
        }
    }

    /// Replace the pending payload and restart the quiet-window timer.
    pub fn schedule(&mut self, code: String) {
        self.dirty.mark();
        *lock(&self.pending) = Some(code);

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let pending = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        let project = self.project;
        let dirty = self.dirty.clone();
        let delay = self.delay;
        // The payload stays in the slot until the write attempt completes, so
        // a flush that lands mid-write still sees it and writes it again.
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let payload = lock(&pending).clone();
            if let Some(code) = payload {
                write(&*sink, &project, &code, &dirty).await;
                let mut slot = lock(&pending);
                if slot.as_deref() == Some(code.as_str()) {
                    *slot = None;
                }
            }
        }));
    }

    /// Bypass the quiet window and write `code` right away.
    ///
    /// Used when the buffer becomes empty: clearing is persisted with the
    /// mutation instead of waiting out the window.
    pub async fn save_now(&mut self, code: &str) {
        self.dirty.mark();
        self.cancel_timer();
        *lock(&self.pending) = None;
        write(&*self.sink, &self.project, code, &self.dirty).await;
    }

    /// Force any pending debounced write to fire immediately.
    ///
    /// Called at session teardown so an in-window edit is not lost. A timer
    /// task aborted mid-write leaves its payload in the slot, so the flush
    /// repeats that write rather than dropping it.
    pub async fn flush(&mut self) {
        self.cancel_timer();
        let payload = lock(&self.pending).take();
        if let Some(code) = payload {
            write(&*self.sink, &self.project, &code, &self.dirty).await;
        }
    }

    /// Whether a debounced payload has not yet completed a write attempt.
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Write through the sink; failures are logged and swallowed. The buffer is
/// not rolled back and no retry is scheduled; the next mutation's debounce
/// cycle is the only recovery path.
async fn write(sink: &dyn CodeSink, project: &ProjectId, code: &str, dirty: &DirtyFlag) {
    match sink.persist(project, code).await {
        Ok(()) => dirty.clear(),
        Err(error) => warn!(%project, %error, "autosave failed"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
