// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{AuthenticatedUser, Role},
    state::AppState,
    storage::{StoredCategory, StoredRecipe, StoredRole},
    variant::Variant,
};

pub mod health;
pub mod recipes;
pub mod users;

/// Routes of one service, split by whether they need an authenticated user.
pub struct ServiceRoutes {
    pub public: Router<AppState>,
    pub protected: Router<AppState>,
}

pub fn routes(variant: Variant) -> ServiceRoutes {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    match variant {
        Variant::Recipe => ServiceRoutes {
            public: public
                .route("/api/recipes", get(recipes::list_recipes))
                .route("/api/categories", get(recipes::list_categories)),
            protected: Router::new(),
        },
        Variant::User => ServiceRoutes {
            public: public.route("/api/roles", get(users::list_roles)),
            protected: Router::new().route("/api/users/me", get(users::get_current_user)),
        },
    }
}

/// OpenAPI document served by the development documentation UI.
pub fn openapi(variant: Variant) -> utoipa::openapi::OpenApi {
    match variant {
        Variant::Recipe => RecipeApiDoc::openapi(),
        Variant::User => UserApiDoc::openapi(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        recipes::list_recipes,
        recipes::list_categories
    ),
    components(
        schemas(
            StoredRecipe,
            StoredCategory,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Recipes", description = "Recipe catalogue")
    )
)]
struct RecipeApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::get_current_user,
        users::list_roles
    ),
    components(
        schemas(
            StoredRole,
            Role,
            AuthenticatedUser,
            users::UserMeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Current user and roles")
    )
)]
struct UserApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
