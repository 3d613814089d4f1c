//! Account endpoints: sign-up, login, logout, and session resolution.
//!
//! ```text
//! POST /signup {"fullname":"Ada","email":"ada@example.com","password":"secret"}
//! POST /login  {"email":"ada@example.com","password":"secret"}
//! ```

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::auth::Registration;
use crate::domain::{Error, User};

use super::session::SessionContext;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /signup`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account; the password hash never leaves the domain.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            fullname: user.fullname.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
        }
    }
}

/// `{user}` envelope shared by sign-up, login, and session resolution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserDto,
}

impl From<&User> for UserEnvelope {
    fn from(user: &User) -> Self {
        Self { user: user.into() }
    }
}

/// Register a new account and establish a session.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Missing field or email already registered", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let SignupRequest {
        fullname,
        email,
        password,
    } = payload.into_inner();
    let user = state
        .auth
        .register(Registration {
            fullname,
            email,
            password,
        })
        .await?;
    session.persist_user(&user.id)?;
    Ok(HttpResponse::Created().json(UserEnvelope::from(&user)))
}

/// Verify credentials and establish a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let user = state.auth.authenticate(&email, &password).await?;
    session.persist_user(&user.id)?;
    Ok(HttpResponse::Ok().json(UserEnvelope::from(&user)))
}

/// Drop the session and expire the cookie.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cleared")
    ),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.purge();
    Ok(HttpResponse::Ok().finish())
}

/// Resolve the session back to its account.
#[utoipa::path(
    get,
    path = "/getUser",
    responses(
        (status = 200, description = "Authenticated account", body = UserEnvelope),
        (status = 401, description = "No session", body = Error),
        (status = 404, description = "Account no longer exists", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/getUser")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let user = state.auth.resolve(&user_id).await?;
    Ok(HttpResponse::Ok().json(UserEnvelope::from(&user)))
}
