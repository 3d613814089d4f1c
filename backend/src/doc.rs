//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API: every
//! endpoint from the inbound layer, the request/response schemas, and the
//! session cookie security scheme. Swagger UI serves the document in debug
//! builds only.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::projects::{
    CreateProjectRequest, ProjectDto, ProjectEnvelope, ProjectsEnvelope, SaveProjectRequest,
};
use crate::inbound::http::users::{LoginRequest, SignupRequest, UserDto, UserEnvelope};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /signup or POST /login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Playground backend API",
        description = "Accounts, per-user code projects, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::get_user,
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::save_project,
        crate::inbound::http::projects::get_projects,
        crate::inbound::http::projects::select_project,
        crate::inbound::http::projects::delete_project,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        SignupRequest,
        LoginRequest,
        UserDto,
        UserEnvelope,
        CreateProjectRequest,
        SaveProjectRequest,
        ProjectDto,
        ProjectEnvelope,
        ProjectsEnvelope,
    )),
    tags(
        (name = "users", description = "Account registration and sessions"),
        (name = "projects", description = "Per-user code projects"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn registers_every_endpoint_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/signup",
            "/login",
            "/logout",
            "/getUser",
            "/createproject",
            "/saveproject",
            "/getprojects",
            "/selectproject/{id}",
            "/deleteproject/{id}",
            "/health/ready",
            "/health/live",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "OpenAPI document should describe {path}"
            );
        }
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn project_schema_uses_wire_field_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let project_schema = schemas.get("ProjectDto").expect("ProjectDto schema");

        assert_object_schema_has_field(project_schema, "projLanguage");
        assert_object_schema_has_field(project_schema, "createdBy");
    }
}
