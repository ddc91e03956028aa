// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::ConfigError;
use crate::init::InitStage;
use crate::storage::PersistenceError;

/// Startup failures that abort the process.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A failure outside the recognized connectivity class.
    #[error("{stage} failed: {source}")]
    Initialization {
        stage: InitStage,
        #[source]
        source: PersistenceError,
    },

    #[error("invalid bind address {address}: {reason}")]
    BindAddress { address: String, reason: String },

    #[error("failed to load TLS credentials: {0}")]
    Tls(#[source] std::io::Error),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

/// Persistence failures surface as ordinary request errors, whether or not
/// the process started degraded.
impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        tracing::warn!(error = %e, "Request failed on persistence");
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
