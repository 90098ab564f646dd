// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! HTTP handlers for the auth API.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use folio_common::{
    DashboardSession, LoginRequest, LoginResponse, MessageResponse, Permissions, RegisterRequest,
    UserResponse,
};

use crate::auth::{Author, AuthUser, RequireRole};
use crate::error::AppError;
use crate::storage::UserStore;
use crate::AppState;

/// `POST /api/auth/login`
pub async fn login<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let Json(req) = payload?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }

    let (jar, response) = state.auth.login(jar, &req.email, &req.password).await?;
    Ok((jar, Json(response)))
}

/// `POST /api/auth/logout`
pub async fn logout<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = state.auth.logout(jar);
    (
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
}

/// `GET /api/auth/me`
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}

/// `POST /api/auth/register`
pub async fn register<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(req) = payload?;
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Name, email, and password are required".to_string(),
        ));
    }

    let user = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// `GET /api/auth/roles`
pub async fn roles<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    jar: CookieJar,
) -> Result<Json<Permissions>, AppError> {
    Ok(Json(state.auth.permissions(&jar).await?))
}

/// `GET /api/dashboard/session`
pub async fn dashboard_session(gate: RequireRole<Author>) -> Json<DashboardSession> {
    let user = gate.into_inner();
    let permissions = Permissions::for_role(Some(user.role));
    Json(DashboardSession { user, permissions })
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
