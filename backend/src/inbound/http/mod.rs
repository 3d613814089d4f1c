//! HTTP inbound adapter exposing the REST endpoints.

pub mod error;
pub mod health;
pub mod projects;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register every REST endpoint on a service config.
///
/// Used by the server wiring and by integration tests so both expose the
/// same surface.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(users::signup)
        .service(users::login)
        .service(users::logout)
        .service(users::get_user)
        .service(projects::create_project)
        .service(projects::save_project)
        .service(projects::get_projects)
        .service(projects::select_project)
        .service(projects::delete_project);
}
