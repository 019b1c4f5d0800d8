//! `POST /login` and `GET /health`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, AuthError};
use crate::state::AppState;
use farmasys_core::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub database: bool,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body?;
    let username = request.username.trim();

    let Some(user) = state
        .db
        .users()
        .verify_credentials(username, &request.password)
        .await?
    else {
        warn!(username = %username, "Login rejected");
        return Err(AuthError::InvalidCredentials.into());
    };

    let token = state.jwt.generate_token(&user.username, user.role)?;
    info!(username = %user.username, role = %user.role, "Login succeeded");

    Ok(Json(LoginResponse {
        ok: true,
        token,
        username: user.username,
        role: user.role,
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    Json(HealthResponse { ok: database, database })
}
