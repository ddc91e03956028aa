// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication for the User service. The Recipe service
//! installs none of this; its gateway authorizer validates tokens upstream.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. [`middleware::authenticate`] verifies the HS256 signature, `exp`,
//!    issuer and audience with zero clock skew
//! 3. [`middleware::require_authenticated`] rejects anonymous requests on
//!    protected routes with `401`
//! 4. Handlers read the user through the [`Auth`] extractor

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod roles;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use roles::Role;
