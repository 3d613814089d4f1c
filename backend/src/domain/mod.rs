//! Domain layer: entities, services, and ports.
//!
//! Everything here is transport agnostic. Inbound adapters translate HTTP
//! requests into calls on the services; outbound adapters implement the port
//! traits in [`ports`].

pub mod auth;
pub mod editor;
pub mod error;
pub mod ports;
pub mod project;
pub mod projects;
pub mod user;

pub use auth::AuthService;
pub use editor::EditorSession;
pub use error::{Error, ErrorCode};
pub use project::{Language, Project, ProjectId, ProjectName};
pub use projects::ProjectService;
pub use user::{Email, FullName, User, UserId};

/// Response header carrying the request-scoped trace identifier.
pub const TRACE_ID_HEADER: &str = "Trace-Id";
