// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::StoredRole;

/// Response for GET /api/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID (`sub` claim)
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User's role
    pub role: Role,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

/// List the roles a user can hold.
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Users",
    responses(
        (status = 200, description = "Roles", body = [StoredRole]),
        (status = 500, description = "Persistence failure"),
    )
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<StoredRole>>, ApiError> {
    Ok(Json(state.store.list_roles()?))
}
