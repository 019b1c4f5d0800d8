//! Staff account management.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use farmasys_core::{Capability, Role, User, ValidationError};

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `admin` or `cashier`; defaults to `cashier`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: User,
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    principal.require(Capability::ManageUsers)?;
    let Json(body) = body?;

    let role = match body.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => Role::Cashier,
        Some(text) => text.parse::<Role>().map_err(|_| ValidationError::NotAllowed {
            field: "role".to_string(),
            allowed: vec![Role::Admin.to_string(), Role::Cashier.to_string()],
        })?,
    };

    let user = state
        .db
        .users()
        .create(&body.username, &body.password, role)
        .await?;

    Ok(Json(UserResponse { ok: true, user }))
}
