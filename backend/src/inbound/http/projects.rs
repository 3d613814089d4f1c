//! Project endpoints: create, save, list, select, delete.
//!
//! Every operation resolves the owner from the session; a project owned by
//! another account answers 404, never 403, so ids do not leak existence.

use actix_web::{get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Project, ProjectId};

use super::session::SessionContext;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /createproject`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(rename = "projLanguage")]
    pub proj_language: String,
}

/// Request body for `POST /saveproject`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SaveProjectRequest {
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
    pub code: String,
}

/// Public view of a project.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "projLanguage")]
    pub proj_language: String,
    #[serde(rename = "createdBy")]
    pub created_by: Uuid,
    pub code: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        Self {
            id: *project.id.as_uuid(),
            name: project.name.as_str().to_owned(),
            proj_language: project.language.as_str().to_owned(),
            created_by: *project.owner.as_uuid(),
            code: project.code.clone(),
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// `{project}` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectEnvelope {
    pub project: ProjectDto,
}

impl From<&Project> for ProjectEnvelope {
    fn from(project: &Project) -> Self {
        Self {
            project: project.into(),
        }
    }
}

/// `{projects}` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectsEnvelope {
    pub projects: Vec<ProjectDto>,
}

/// Create a project seeded with its language template.
#[utoipa::path(
    post,
    path = "/createproject",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectEnvelope),
        (status = 400, description = "Missing name", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("/createproject")]
pub async fn create_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let CreateProjectRequest {
        name,
        proj_language,
    } = payload.into_inner();
    let project = state.projects.create(&owner, &name, &proj_language).await?;
    Ok(HttpResponse::Created().json(ProjectEnvelope::from(&project)))
}

/// Overwrite a project's code blob (last write wins).
#[utoipa::path(
    post,
    path = "/saveproject",
    request_body = SaveProjectRequest,
    responses(
        (status = 200, description = "Project saved", body = ProjectEnvelope),
        (status = 401, description = "No session", body = Error),
        (status = 404, description = "Unknown project id", body = Error)
    ),
    tags = ["projects"],
    operation_id = "saveProject"
)]
#[post("/saveproject")]
pub async fn save_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SaveProjectRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let SaveProjectRequest { project_id, code } = payload.into_inner();
    let project = state
        .projects
        .save(&owner, &ProjectId::from(project_id), &code)
        .await?;
    Ok(HttpResponse::Ok().json(ProjectEnvelope::from(&project)))
}

/// List the caller's projects, most recently updated first.
#[utoipa::path(
    get,
    path = "/getprojects",
    responses(
        (status = 200, description = "Owned projects", body = ProjectsEnvelope),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["projects"],
    operation_id = "getProjects"
)]
#[get("/getprojects")]
pub async fn get_projects(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let projects = state.projects.list(&owner).await?;
    let envelope = ProjectsEnvelope {
        projects: projects.iter().map(ProjectDto::from).collect(),
    };
    Ok(HttpResponse::Ok().json(envelope))
}

fn parse_project_id(raw: &str) -> Result<ProjectId, Error> {
    ProjectId::parse(raw).map_err(|_| Error::invalid_request("project id must be a UUID"))
}

/// Fetch one project by id.
#[utoipa::path(
    get,
    path = "/selectproject/{id}",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Project", body = ProjectEnvelope),
        (status = 400, description = "Malformed project id", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 404, description = "Unknown project id", body = Error)
    ),
    tags = ["projects"],
    operation_id = "selectProject"
)]
#[get("/selectproject/{id}")]
pub async fn select_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let id = parse_project_id(&path.into_inner())?;
    let project = state.projects.get(&owner, &id).await?;
    Ok(HttpResponse::Ok().json(ProjectEnvelope::from(&project)))
}

/// Remove one project by id.
#[utoipa::path(
    get,
    path = "/deleteproject/{id}",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 400, description = "Malformed project id", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 404, description = "Unknown project id", body = Error)
    ),
    tags = ["projects"],
    operation_id = "deleteProject"
)]
#[get("/deleteproject/{id}")]
pub async fn delete_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let id = parse_project_id(&path.into_inner())?;
    state.projects.delete(&owner, &id).await?;
    Ok(HttpResponse::Ok().finish())
}
