// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token rejections. Every variant answers `401` with a JSON body
//! carrying a stable `error_code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingAuthHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    InvalidAuthHeader,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token was issued by an unexpected issuer")]
    InvalidIssuer,

    #[error("Token is not meant for this audience")]
    InvalidAudience,

    #[error("Token is not valid yet")]
    TokenNotYetValid,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            // Missing required claims, bad base64, wrong algorithm.
            _ => AuthError::MalformedToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "error_code": self.error_code(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use jsonwebtoken::errors::Error;

    #[tokio::test]
    async fn rejection_is_401_with_code() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "token_expired");
        assert_eq!(body["error"], "Token has expired");
    }

    #[test]
    fn validation_failures_keep_their_cause() {
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::ExpiredSignature)),
            AuthError::TokenExpired
        );
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::InvalidIssuer)),
            AuthError::InvalidIssuer
        );
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::InvalidAudience)),
            AuthError::InvalidAudience
        );
    }

    #[test]
    fn unrecognized_failures_are_malformed() {
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::InvalidToken)),
            AuthError::MalformedToken
        );
        assert_eq!(
            AuthError::from(Error::from(ErrorKind::MissingRequiredClaim("sub".to_string()))),
            AuthError::MalformedToken
        );
    }
}
