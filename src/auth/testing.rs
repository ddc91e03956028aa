// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token helpers shared by unit tests.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use super::claims::TokenClaims;
use crate::config::JwtSettings;
use crate::policy::TokenValidation;

pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret!";
pub const TEST_ISSUER: &str = "recipe-app";
pub const TEST_AUDIENCE: &str = "recipe-app-clients";

pub fn test_settings() -> JwtSettings {
    JwtSettings {
        secret_key: TEST_SECRET.to_string(),
        issuer: TEST_ISSUER.to_string(),
        audience: TEST_AUDIENCE.to_string(),
        expiration_minutes: 60,
    }
}

pub fn test_validation() -> TokenValidation {
    TokenValidation::from_settings(&test_settings())
}

pub fn mint_token(sub: &str, expires_in_secs: i64) -> String {
    mint_token_for(sub, expires_in_secs, TEST_ISSUER, TEST_AUDIENCE)
}

pub fn mint_token_for(sub: &str, expires_in_secs: i64, issuer: &str, audience: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: sub.to_string(),
        exp: now + expires_in_secs,
        iat: now,
        iss: issuer.to_string(),
        aud: audience.to_string(),
        email: None,
        role: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encodes")
}
