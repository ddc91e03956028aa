// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service variants and the capabilities that drive the bootstrap sequence.
//!
//! Both services run the same startup skeleton. Divergence points
//! (authentication, seeding, which command handlers get registered) are
//! read from [`Capabilities`] rather than duplicated per entry point.

use std::fmt;

/// Deployed entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Recipe service. Authorization is enforced upstream by the gateway
    /// authorizer, so the process installs no authentication middleware.
    Recipe,
    /// User service. Validates bearer tokens itself and seeds baseline data.
    User,
}

impl Variant {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Variant::Recipe => Capabilities {
                variant: self,
                name: "recipe",
                requires_authentication: false,
                requires_seeding: false,
                handler_scope: RECIPE_HANDLERS,
            },
            Variant::User => Capabilities {
                variant: self,
                name: "user",
                requires_authentication: true,
                requires_seeding: true,
                handler_scope: USER_HANDLERS,
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capabilities().name)
    }
}

/// A named module of command/query handlers registered as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerScope {
    pub name: &'static str,
    pub handlers: &'static [&'static str],
}

pub const RECIPE_HANDLERS: HandlerScope = HandlerScope {
    name: "recipes",
    handlers: &[
        "CreateRecipeCommand",
        "UpdateRecipeCommand",
        "DeleteRecipeCommand",
        "GetRecipeQuery",
        "ListRecipesQuery",
    ],
};

pub const USER_HANDLERS: HandlerScope = HandlerScope {
    name: "auth",
    handlers: &[
        "SignupCommand",
        "LoginCommand",
        "RefreshTokenCommand",
        "GetCurrentUserQuery",
    ],
};

/// Per-variant switches consulted by every bootstrap stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub variant: Variant,
    pub name: &'static str,
    pub requires_authentication: bool,
    pub requires_seeding: bool,
    pub handler_scope: HandlerScope,
}
