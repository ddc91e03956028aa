// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles carried in the `role` token claim.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role reported back to the caller by `/api/users/me`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Registered user (least privilege for authenticated callers)
    #[default]
    User,
}

impl Role {
    /// Parse role from a claim value (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}
