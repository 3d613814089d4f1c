//! Autocompletion-candidate derivation and registration.
//!
//! The session tokenizes its buffer on every mutation and republishes the
//! candidate set, scoped to the buffer's language. Each publication disposes
//! the previous registration before installing the new one: stale or
//! duplicate registrations must not coexist.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::project::Language;

/// Tokens this short are noise, not identifiers worth suggesting.
const MIN_CANDIDATE_LEN: usize = 3;

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| {
        // Alphanumeric/underscore runs beginning with a letter or underscore.
        #[expect(clippy::expect_used, reason = "the pattern is a valid literal")]
        Regex::new(r"\b[A-Za-z_]\w*").expect("identifier pattern is valid")
    })
}

/// Tokenize a buffer into deduplicated candidates, first occurrence first,
/// dropping tokens of length <= 2.
pub fn extract_candidates(buffer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for token in identifier_regex().find_iter(buffer) {
        let token = token.as_str();
        if token.len() < MIN_CANDIDATE_LEN {
            continue;
        }
        if seen.insert(token) {
            candidates.push(token.to_owned());
        }
    }
    candidates
}

struct Provider {
    language: Language,
    candidates: Vec<String>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    providers: HashMap<u64, Provider>,
}

/// Shared suggestion-source registry for the editor's completion UI.
#[derive(Default)]
pub struct SuggestionRegistry {
    inner: Mutex<RegistryInner>,
}

impl SuggestionRegistry {
    /// Install a candidate set for `language` and hand back its registration.
    ///
    /// The caller keeps at most one live [`SuggestionRegistration`]; dropping
    /// it (or a replacement registration) deregisters the provider.
    pub fn register(
        self: &Arc<Self>,
        language: Language,
        candidates: Vec<String>,
    ) -> SuggestionRegistration {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.providers.insert(
            id,
            Provider {
                language,
                candidates,
            },
        );
        SuggestionRegistration {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Candidates currently published for `language`, across registrations.
    pub fn suggestions_for(&self, language: &Language) -> Vec<String> {
        let inner = lock(&self.inner);
        let mut out = Vec::new();
        for provider in inner.providers.values() {
            if &provider.language == language {
                out.extend(provider.candidates.iter().cloned());
            }
        }
        out
    }

    /// Number of live registrations.
    pub fn active_count(&self) -> usize {
        lock(&self.inner).providers.len()
    }

    fn deregister(&self, id: u64) {
        lock(&self.inner).providers.remove(&id);
    }
}

/// Handle for one published candidate set; deregisters on drop.
pub struct SuggestionRegistration {
    id: u64,
    registry: Weak<SuggestionRegistry>,
}

impl SuggestionRegistration {
    /// Explicitly dispose the registration.
    pub fn dispose(self) {}
}

impl Drop for SuggestionRegistration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
