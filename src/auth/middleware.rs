// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization middleware for Axum.
//!
//! The two steps are separate layers and must be installed in this order:
//!
//! 1. [`authenticate`] runs on every request. A valid bearer token attaches
//!    an [`AuthenticatedUser`] to the request extensions; a missing token
//!    leaves the request anonymous; an invalid token records the failure
//!    and still lets the request through, so public routes keep working.
//! 2. [`require_authenticated`] guards protected routes and rejects any
//!    request that step 1 did not authenticate.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/users/me", get(get_current_user))
//!     .route_layer(axum::middleware::from_fn(require_authenticated));
//!
//! let app = protected.layer(axum::middleware::from_fn_with_state(
//!     token_validation,
//!     authenticate,
//! ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::decode;

use super::{claims::TokenClaims, AuthError, AuthenticatedUser};
use crate::policy::TokenValidation;

/// Authentication failure recorded by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthFailure(pub AuthError);

/// Authentication middleware function.
pub async fn authenticate(
    State(tokens): State<Arc<TokenValidation>>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = bearer_token(&request).map(|token| token.and_then(|t| validate_token(t, &tokens)));

    match outcome {
        None => {}
        Some(Ok(user)) => {
            request.extensions_mut().insert(user);
        }
        Some(Err(e)) => {
            tracing::debug!(error_code = e.error_code(), "Bearer token rejected");
            request.extensions_mut().insert(AuthFailure(e));
        }
    }

    next.run(request).await
}

/// Authorization middleware function.
pub async fn require_authenticated(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_some() {
        return next.run(request).await;
    }

    let error = request
        .extensions()
        .get::<AuthFailure>()
        .map(|failure| failure.0.clone())
        .unwrap_or(AuthError::MissingAuthHeader);

    error.into_response()
}

/// Extract the raw bearer token.
///
/// `None` when no Authorization header is present; an `Err` inside `Some`
/// when the header is present but unusable.
fn bearer_token(request: &Request) -> Option<Result<&str, AuthError>> {
    let header = request.headers().get(AUTHORIZATION)?;

    let token = header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(AuthError::InvalidAuthHeader)
        });

    Some(token)
}

/// Validate a JWT token and return the authenticated user.
pub fn validate_token(token: &str, tokens: &TokenValidation) -> Result<AuthenticatedUser, AuthError> {
    let token_data = decode::<TokenClaims>(token, tokens.decoding_key(), &tokens.validation())?;
    Ok(AuthenticatedUser::from_claims(token_data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{mint_token, test_validation};
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/private", get(|| async { "secret" }))
            .route_layer(axum::middleware::from_fn(require_authenticated))
            .route("/public", get(|| async { "hello" }))
            .layer(axum::middleware::from_fn_with_state(
                Arc::new(test_validation()),
                authenticate,
            ))
    }

    async fn status(request: axum::http::Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    fn get_with_auth(path: &str, header: Option<String>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn valid_token_reaches_protected_route() {
        let token = mint_token("user_1", 300);
        let status = status(get_with_auth("/private", Some(format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        assert_eq!(
            status(get_with_auth("/private", None)).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let token = mint_token("user_1", -5);
        let status = status(get_with_auth("/private", Some(format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_header_is_unauthorized() {
        let status = status(get_with_auth("/private", Some("Token abc".to_string()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_does_not_block_public_routes() {
        let status = status(get_with_auth("/public", Some("Bearer garbage".to_string()))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn expiry_has_no_leeway() {
        let token = mint_token("user_1", -1);
        let err = validate_token(&token, &test_validation()).unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let token = crate::auth::testing::mint_token_for("user_1", 300, "recipe-app", "other-app");
        let err = validate_token(&token, &test_validation()).unwrap_err();
        assert_eq!(err, AuthError::InvalidAudience);
    }
}
