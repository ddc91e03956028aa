// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence and seeding collaborators consumed by the bootstrap sequence.
//!
//! The bootstrap core only calls [`Persistence::ensure_schema`] and
//! [`Seeder::seed_if_empty`]; the remaining methods back the request
//! handlers. Every method opens the database on demand, so after a degraded
//! start each request makes its own connection attempt.
//!
//! ## Storage Layout
//!
//! ```text
//! <connection path>.redb
//!   recipes            # recipe id -> recipe
//!   recipe_categories  # slug -> category (seeded)
//!   roles              # key -> role (seeded)
//!   seed_state         # "baseline" -> last seed marker
//! ```

pub mod error;
pub mod redb_store;
pub mod seed;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use error::{PersistenceError, PersistenceResult};
pub use redb_store::RedbStore;
pub use seed::{SeedMarker, SEED_VERSION};

/// Schema management and reads used by the request handlers.
pub trait Persistence: Send + Sync {
    /// Create every table that does not exist yet. Not a migration engine.
    fn ensure_schema(&self) -> PersistenceResult<()>;

    /// Check that the database can be reached right now.
    fn ping(&self) -> PersistenceResult<()>;

    fn list_recipes(&self) -> PersistenceResult<Vec<StoredRecipe>>;

    fn list_roles(&self) -> PersistenceResult<Vec<StoredRole>>;

    fn list_categories(&self) -> PersistenceResult<Vec<StoredCategory>>;
}

/// Idempotent baseline population.
pub trait Seeder: Send + Sync {
    /// Insert every baseline record that is not already present.
    fn seed_if_empty(&self) -> PersistenceResult<SeedReport>;
}

/// A backing store offering both collaborator roles.
pub trait Store: Persistence + Seeder {}

impl<T: Persistence + Seeder> Store for T {}

/// Outcome of one seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredRecipe {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredRole {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredCategory {
    pub slug: String,
    pub name: String,
}
