// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Baseline records inserted into a freshly provisioned database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StoredCategory, StoredRole};

/// Bumped whenever the baseline set changes.
pub const SEED_VERSION: u32 = 1;

pub(crate) const SEED_MARKER_KEY: &str = "baseline";

/// Records the last seed run that completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMarker {
    pub version: u32,
    pub seeded_at: DateTime<Utc>,
}

pub struct BaselineRole {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

impl BaselineRole {
    pub fn to_stored(&self) -> StoredRole {
        StoredRole {
            key: self.key.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
        }
    }
}

pub struct BaselineCategory {
    pub slug: &'static str,
    pub name: &'static str,
}

impl BaselineCategory {
    pub fn to_stored(&self) -> StoredCategory {
        StoredCategory {
            slug: self.slug.to_string(),
            name: self.name.to_string(),
        }
    }
}

pub const BASELINE_ROLES: &[BaselineRole] = &[
    BaselineRole {
        key: "admin",
        name: "Admin",
        description: "Full administrative access",
    },
    BaselineRole {
        key: "user",
        name: "User",
        description: "Registered user managing their own recipes",
    },
];

pub const BASELINE_CATEGORIES: &[BaselineCategory] = &[
    BaselineCategory {
        slug: "breakfast",
        name: "Breakfast",
    },
    BaselineCategory {
        slug: "lunch",
        name: "Lunch",
    },
    BaselineCategory {
        slug: "dinner",
        name: "Dinner",
    },
    BaselineCategory {
        slug: "dessert",
        name: "Dessert",
    },
    BaselineCategory {
        slug: "snack",
        name: "Snack",
    },
    BaselineCategory {
        slug: "beverage",
        name: "Beverage",
    },
];
