//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the embedded store, the remote execution API). Each trait exposes
//! strongly typed errors so adapters map their failures into predictable
//! variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::error::Error as DomainError;
use super::project::{Language, Project, ProjectId};
use super::user::{Email, User, UserId};

/// Errors surfaced by the persistence adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Store could not be opened or the connection failed.
    #[error("store connection failed: {message}")]
    Connection { message: String },
    /// A statement failed to execute or a row failed to decode.
    #[error("store query failed: {message}")]
    Query { message: String },
    /// A uniqueness constraint was violated.
    #[error("duplicate value for unique column {column}")]
    Duplicate { column: String },
}

impl PersistenceError {
    /// Helper for connection-level failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for statement or decode failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for uniqueness violations.
    pub fn duplicate(column: impl Into<String>) -> Self {
        Self::Duplicate {
            column: column.into(),
        }
    }
}

impl From<PersistenceError> for DomainError {
    fn from(value: PersistenceError) -> Self {
        DomainError::internal(value.to_string())
    }
}

/// Persistence port for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with [`PersistenceError::Duplicate`] when
    /// the email is already registered.
    async fn insert(&self, user: &User) -> Result<(), PersistenceError>;

    /// Look an account up by its normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, PersistenceError>;

    /// Look an account up by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError>;
}

/// Persistence port for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a new project.
    async fn insert(&self, project: &Project) -> Result<(), PersistenceError>;

    /// All projects owned by `owner`, most recently updated first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Project>, PersistenceError>;

    /// Look a project up by id.
    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, PersistenceError>;

    /// Overwrite the code blob and bump `updated_at`. Returns the updated
    /// project, or `None` when the id is absent.
    async fn update_code(
        &self,
        id: &ProjectId,
        code: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Project>, PersistenceError>;

    /// Remove a project. Returns `false` when the id is absent.
    async fn delete(&self, id: &ProjectId) -> Result<bool, PersistenceError>;
}

/// Persistence target for editor autosave writes.
///
/// The editor session does not see the owner or the HTTP layer; it writes
/// through this narrow port and treats failures as log-and-continue.
#[async_trait]
pub trait CodeSink: Send + Sync {
    /// Overwrite the stored code for `project`.
    async fn persist(&self, project: &ProjectId, code: &str) -> Result<(), DomainError>;
}

/// One code submission to the remote execution API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Language tag understood by the execution API.
    pub language: Language,
    /// Runtime version selector; `*` means "latest available".
    pub version: String,
    /// File name shown in diagnostics, e.g. `Main.py`.
    pub file_name: String,
    /// Full source to execute.
    pub content: String,
}

/// Captured output of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
}

/// Errors surfaced by the execution adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The request never completed (DNS, connect, timeout).
    #[error("execution transport failed: {message}")]
    Transport { message: String },
    /// The API answered with a non-success status.
    #[error("execution API returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("execution response could not be decoded: {message}")]
    Decode { message: String },
}

impl ExecutionError {
    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for decode failures.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Remote code execution port.
///
/// The system is a pure client of the execution API: no sandboxing or
/// resource limiting happens on this side of the port.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Run the submitted file and return captured stdout/stderr.
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecutionError>;
}
