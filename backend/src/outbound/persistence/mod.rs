//! Embedded SQLite persistence adapter.
//!
//! One [`SqliteStore`] owns the connection; the repository handles returned
//! by [`SqliteStore::users`] and [`SqliteStore::projects`] share it behind a
//! mutex. Identifiers are stored as canonical UUID text and timestamps as
//! RFC 3339 text, so rows stay greppable with the sqlite3 shell.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use crate::domain::ports::{PersistenceError, ProjectRepository, UserRepository};
use crate::domain::project::{Language, Project, ProjectId, ProjectName};
use crate::domain::user::{Email, FullName, User, UserId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    fullname      TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email);

CREATE TABLE IF NOT EXISTS projects (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    language   TEXT NOT NULL,
    owner      TEXT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    code       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects (owner, updated_at DESC);
";

/// Shared handle to one SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and install the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|error| PersistenceError::connection(error.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database. Used by tests.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()
            .map_err(|error| PersistenceError::connection(error.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|error| PersistenceError::connection(error.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|error| PersistenceError::connection(error.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Repository handle for user accounts.
    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository {
            conn: Arc::clone(&self.conn),
        }
    }

    /// Repository handle for projects.
    pub fn projects(&self) -> SqliteProjectRepository {
        SqliteProjectRepository {
            conn: Arc::clone(&self.conn),
        }
    }
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

fn map_write_error(error: rusqlite::Error) -> PersistenceError {
    if let rusqlite::Error::SqliteFailure(code, ref message) = error {
        if code.code == ErrorCode::ConstraintViolation {
            let column = message
                .as_deref()
                .and_then(|text| text.rsplit('.').next())
                .unwrap_or("unknown")
                .to_owned();
            return PersistenceError::duplicate(column);
        }
    }
    PersistenceError::query(error.to_string())
}

fn map_query_error(error: rusqlite::Error) -> PersistenceError {
    PersistenceError::query(error.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.with_timezone(&Utc))
        .map_err(|error| PersistenceError::query(format!("bad stored timestamp {raw:?}: {error}")))
}

/// Raw user row before newtype validation.
struct UserRow {
    id: String,
    fullname: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            fullname: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_domain(self) -> Result<User, PersistenceError> {
        Ok(User {
            id: UserId::parse(&self.id)
                .map_err(|error| PersistenceError::query(format!("bad stored user id: {error}")))?,
            fullname: FullName::new(&self.fullname)
                .map_err(|error| PersistenceError::query(error.to_string()))?,
            email: Email::new(&self.email)
                .map_err(|error| PersistenceError::query(error.to_string()))?,
            password_hash: self.password_hash,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Raw project row before newtype validation.
struct ProjectRow {
    id: String,
    name: String,
    language: String,
    owner: String,
    code: String,
    created_at: String,
    updated_at: String,
}

impl ProjectRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            language: row.get(2)?,
            owner: row.get(3)?,
            code: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_domain(self) -> Result<Project, PersistenceError> {
        let id = uuid::Uuid::parse_str(&self.id)
            .map_err(|error| PersistenceError::query(format!("bad stored project id: {error}")))?;
        let owner = UserId::parse(&self.owner)
            .map_err(|error| PersistenceError::query(format!("bad stored owner id: {error}")))?;
        Ok(Project {
            id: ProjectId::from(id),
            name: ProjectName::new(&self.name)
                .map_err(|error| PersistenceError::query(error.to_string()))?,
            language: Language::parse(&self.language),
            owner,
            code: self.code,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// [`UserRepository`] backed by the shared connection.
#[derive(Clone)]
pub struct SqliteUserRepository {
    conn: Arc<Mutex<Connection>>,
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<(), PersistenceError> {
        let conn = lock(&self.conn);
        conn.execute(
            "INSERT INTO users (id, fullname, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.fullname.as_str(),
                user.email.as_str(),
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        )
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, PersistenceError> {
        let conn = lock(&self.conn);
        conn.query_row(
            "SELECT id, fullname, email, password_hash, created_at
             FROM users WHERE email = ?1",
            params![email.as_str()],
            UserRow::from_row,
        )
        .optional()
        .map_err(map_query_error)?
        .map(UserRow::into_domain)
        .transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, PersistenceError> {
        let conn = lock(&self.conn);
        conn.query_row(
            "SELECT id, fullname, email, password_hash, created_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            UserRow::from_row,
        )
        .optional()
        .map_err(map_query_error)?
        .map(UserRow::into_domain)
        .transpose()
    }
}

/// [`ProjectRepository`] backed by the shared connection.
#[derive(Clone)]
pub struct SqliteProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

const PROJECT_COLUMNS: &str = "id, name, language, owner, code, created_at, updated_at";

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn insert(&self, project: &Project) -> Result<(), PersistenceError> {
        let conn = lock(&self.conn);
        conn.execute(
            "INSERT INTO projects (id, name, language, owner, code, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.language.as_str(),
                project.owner.to_string(),
                project.code,
                project.created_at.to_rfc3339(),
                project.updated_at.to_rfc3339(),
            ],
        )
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Project>, PersistenceError> {
        let conn = lock(&self.conn);
        let mut statement = conn
            .prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE owner = ?1 ORDER BY updated_at DESC, id"
            ))
            .map_err(map_query_error)?;
        let rows = statement
            .query_map(params![owner.to_string()], ProjectRow::from_row)
            .map_err(map_query_error)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row.map_err(map_query_error)?.into_domain()?);
        }
        Ok(projects)
    }

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, PersistenceError> {
        let conn = lock(&self.conn);
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id.to_string()],
            ProjectRow::from_row,
        )
        .optional()
        .map_err(map_query_error)?
        .map(ProjectRow::into_domain)
        .transpose()
    }

    async fn update_code(
        &self,
        id: &ProjectId,
        code: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Project>, PersistenceError> {
        let updated = {
            let conn = lock(&self.conn);
            conn.execute(
                "UPDATE projects SET code = ?1, updated_at = ?2 WHERE id = ?3",
                params![code, updated_at.to_rfc3339(), id.to_string()],
            )
            .map_err(map_write_error)?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &ProjectId) -> Result<bool, PersistenceError> {
        let conn = lock(&self.conn);
        let deleted = conn
            .execute(
                "DELETE FROM projects WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(map_write_error)?;
        Ok(deleted > 0)
    }
}
