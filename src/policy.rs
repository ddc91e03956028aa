// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Policy Selection
//!
//! Derives the cross-origin policies and the token validation descriptor
//! from validated configuration.
//!
//! Two CORS policies always exist:
//!
//! | Policy | Origins | Active in |
//! |--------|---------|-----------|
//! | `AllowAll` | any | Development |
//! | `AllowFrontend` | `Cors:AllowedOrigins`, or any when unset | Production |
//!
//! Leaving `Cors:AllowedOrigins` unset keeps production permissive.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{EnvironmentMode, JwtSettings, ValidatedConfig};
use crate::variant::Capabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsPolicyName {
    AllowAll,
    AllowFrontend,
}

impl fmt::Display for CorsPolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsPolicyName::AllowAll => write!(f, "AllowAll"),
            CorsPolicyName::AllowFrontend => write!(f, "AllowFrontend"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRule {
    Any,
    List(Vec<String>),
}

/// A named CORS policy. Methods and headers are always unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub name: CorsPolicyName,
    pub origins: OriginRule,
}

impl CorsPolicy {
    pub fn allow_all() -> Self {
        Self {
            name: CorsPolicyName::AllowAll,
            origins: OriginRule::Any,
        }
    }

    pub fn allow_frontend(origins: &[String]) -> Self {
        let origins = if origins.is_empty() {
            OriginRule::Any
        } else {
            OriginRule::List(origins.to_vec())
        };
        Self {
            name: CorsPolicyName::AllowFrontend,
            origins,
        }
    }

    pub fn is_permissive(&self) -> bool {
        self.origins == OriginRule::Any
    }

    pub fn layer(&self) -> CorsLayer {
        let allow_origin = match &self.origins {
            OriginRule::Any => AllowOrigin::from(Any),
            OriginRule::List(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
                HeaderValue::from_str(origin)
                    .inspect_err(|_| {
                        tracing::warn!(
                            policy = %self.name,
                            origin = %origin,
                            "Origin is not a valid header value; skipped"
                        );
                    })
                    .ok()
            })),
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Bearer token validation parameters.
#[derive(Clone)]
pub struct TokenValidation {
    decoding_key: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub validate_lifetime: bool,
    pub clock_skew: Duration,
    pub expiration_minutes: u32,
}

impl fmt::Debug for TokenValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidation")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validate_lifetime", &self.validate_lifetime)
            .field("clock_skew", &self.clock_skew)
            .finish_non_exhaustive()
    }
}

impl TokenValidation {
    /// Symmetric HS256 validation with zero clock skew.
    pub fn from_settings(jwt: &JwtSettings) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt.secret_key.as_bytes()),
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            validate_lifetime: true,
            clock_skew: Duration::ZERO,
            expiration_minutes: jwt.expiration_minutes,
        }
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = self.validate_lifetime;
        validation.leeway = self.clock_skew.as_secs();
        validation
    }
}

/// Every policy computed at startup.
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub allow_all: CorsPolicy,
    pub allow_frontend: CorsPolicy,
    /// `None` skips authentication entirely.
    pub token_validation: Option<Arc<TokenValidation>>,
}

impl PolicySet {
    pub fn select(config: &ValidatedConfig, caps: &Capabilities) -> Self {
        let token_validation = if caps.requires_authentication {
            config
                .jwt()
                .map(|jwt| Arc::new(TokenValidation::from_settings(jwt)))
        } else {
            None
        };

        Self {
            allow_all: CorsPolicy::allow_all(),
            allow_frontend: CorsPolicy::allow_frontend(config.allowed_origins()),
            token_validation,
        }
    }

    /// The single policy applied to the live pipeline.
    pub fn active_cors(&self, mode: EnvironmentMode) -> &CorsPolicy {
        match mode {
            EnvironmentMode::Development => &self.allow_all,
            EnvironmentMode::Production => &self.allow_frontend,
        }
    }
}
