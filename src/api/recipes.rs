// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipe read endpoints.

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{StoredCategory, StoredRecipe};

/// List recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "Recipes",
    responses(
        (status = 200, description = "Recipes", body = [StoredRecipe]),
        (status = 500, description = "Persistence failure"),
    )
)]
pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<StoredRecipe>>, ApiError> {
    Ok(Json(state.store.list_recipes()?))
}

/// List recipe categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Recipes",
    responses(
        (status = 200, description = "Recipe categories", body = [StoredCategory]),
        (status = 500, description = "Persistence failure"),
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredCategory>>, ApiError> {
    Ok(Json(state.store.list_categories()?))
}
