// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded application database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `recipes`: recipe id → serialized StoredRecipe
//! - `recipe_categories`: category slug → serialized StoredCategory
//! - `roles`: role key → serialized StoredRole
//! - `seed_state`: marker key → serialized SeedMarker
//!
//! ## Connection Policy
//!
//! The file is opened lazily. A successful open is kept for the lifetime of
//! the store; a failed one is not remembered, so every caller retries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use super::seed::{SeedMarker, BASELINE_CATEGORIES, BASELINE_ROLES, SEED_MARKER_KEY, SEED_VERSION};
use super::{
    Persistence, PersistenceError, PersistenceResult, SeedReport, Seeder, StoredCategory,
    StoredRecipe, StoredRole,
};

// =============================================================================
// Table Definitions
// =============================================================================

const RECIPES: TableDefinition<&str, &[u8]> = TableDefinition::new("recipes");

const RECIPE_CATEGORIES: TableDefinition<&str, &[u8]> = TableDefinition::new("recipe_categories");

const ROLES: TableDefinition<&str, &[u8]> = TableDefinition::new("roles");

const SEED_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("seed_state");

// =============================================================================
// RedbStore
// =============================================================================

pub struct RedbStore {
    path: PathBuf,
    db: Mutex<Option<Arc<Database>>>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RedbStore {
    /// Create a store for `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.db.lock().map(|db| db.is_some()).unwrap_or(false)
    }

    /// Open the database if needed.
    ///
    /// The parent directory is never created: a missing mount is reported
    /// as a connectivity failure rather than silently replaced by an empty
    /// local directory.
    fn connect(&self) -> PersistenceResult<Arc<Database>> {
        let mut guard = self
            .db
            .lock()
            .map_err(|_| PersistenceError::other("connection lock poisoned"))?;

        if let Some(db) = guard.as_ref() {
            return Ok(Arc::clone(db));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(PersistenceError::connectivity(format!(
                    "unable to connect: directory {} is not available",
                    parent.display()
                )));
            }
        }

        let db = Database::create(&self.path)?;
        create_tables(&db)?;

        let db = Arc::new(db);
        *guard = Some(Arc::clone(&db));
        tracing::debug!(path = %self.path.display(), "Database connection established");
        Ok(db)
    }

    fn list_table<T: DeserializeOwned>(
        &self,
        definition: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> PersistenceResult<Vec<T>> {
        let db = self.connect()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(definition)?;

        let mut items = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            items.push(serde_json::from_slice(value.value())?);
        }
        Ok(items)
    }
}

/// Create-if-absent for every table. Existing data is left untouched.
fn create_tables(db: &Database) -> PersistenceResult<()> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(RECIPES)?;
        let _ = write_txn.open_table(RECIPE_CATEGORIES)?;
        let _ = write_txn.open_table(ROLES)?;
        let _ = write_txn.open_table(SEED_STATE)?;
    }
    write_txn.commit()?;
    Ok(())
}

impl Persistence for RedbStore {
    fn ensure_schema(&self) -> PersistenceResult<()> {
        let db = self.connect()?;
        create_tables(&db)
    }

    fn ping(&self) -> PersistenceResult<()> {
        self.connect().map(drop)
    }

    fn list_recipes(&self) -> PersistenceResult<Vec<StoredRecipe>> {
        let mut recipes: Vec<StoredRecipe> = self.list_table(RECIPES)?;
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    fn list_roles(&self) -> PersistenceResult<Vec<StoredRole>> {
        self.list_table(ROLES)
    }

    fn list_categories(&self) -> PersistenceResult<Vec<StoredCategory>> {
        self.list_table(RECIPE_CATEGORIES)
    }
}

impl Seeder for RedbStore {
    fn seed_if_empty(&self) -> PersistenceResult<SeedReport> {
        let db = self.connect()?;
        let mut report = SeedReport::default();

        let write_txn = db.begin_write()?;
        {
            let mut roles = write_txn.open_table(ROLES)?;
            for role in BASELINE_ROLES {
                if roles.get(role.key)?.is_some() {
                    report.skipped += 1;
                    continue;
                }
                let json = serde_json::to_vec(&role.to_stored())?;
                roles.insert(role.key, json.as_slice())?;
                report.inserted += 1;
            }

            let mut categories = write_txn.open_table(RECIPE_CATEGORIES)?;
            for category in BASELINE_CATEGORIES {
                if categories.get(category.slug)?.is_some() {
                    report.skipped += 1;
                    continue;
                }
                let json = serde_json::to_vec(&category.to_stored())?;
                categories.insert(category.slug, json.as_slice())?;
                report.inserted += 1;
            }

            let mut state = write_txn.open_table(SEED_STATE)?;
            let marker_exists = state.get(SEED_MARKER_KEY)?.is_some();
            if report.inserted > 0 || !marker_exists {
                let marker = SeedMarker {
                    version: SEED_VERSION,
                    seeded_at: Utc::now(),
                };
                let json = serde_json::to_vec(&marker)?;
                state.insert(SEED_MARKER_KEY, json.as_slice())?;
            }
        }
        write_txn.commit()?;

        Ok(report)
    }
}

impl RedbStore {
    /// Last completed seed run, if any.
    pub fn seed_marker(&self) -> PersistenceResult<Option<SeedMarker>> {
        let db = self.connect()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(SEED_STATE)?;
        match table.get(SEED_MARKER_KEY)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}
