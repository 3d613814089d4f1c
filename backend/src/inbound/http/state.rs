//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::{AuthService, ProjectService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
}

impl HttpState {
    /// Bundle the domain services for handler injection.
    pub fn new(auth: Arc<AuthService>, projects: Arc<ProjectService>) -> Self {
        Self { auth, projects }
    }
}
