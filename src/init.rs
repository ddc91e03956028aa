// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Database initialization with a degrade-instead-of-crash policy.
//!
//! | Failure | Result |
//! |---------|--------|
//! | [`PersistenceError::Connectivity`] | logged once, process serves degraded |
//! | [`PersistenceError::Other`] | [`BootstrapError::Initialization`], startup aborts |
//!
//! Degraded mode starts no background retry. Each request that needs the
//! database makes its own attempt and fails on its own if it is still
//! unreachable. Under sustained traffic against a dead database every request
//! pays a connection attempt; there is no circuit breaker.

use std::fmt;

use crate::error::BootstrapError;
use crate::storage::{Persistence, PersistenceError, SeedReport, Seeder};
use crate::variant::Capabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    Schema,
    Seed,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStage::Schema => write!(f, "schema initialization"),
            InitStage::Seed => write!(f, "seeding"),
        }
    }
}

/// Non-fatal result of database initialization.
///
/// Fatal outcomes are the `Err` side of [`initialize_database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializationOutcome {
    /// Schema is in place; `seed` is set when the variant seeds.
    FullyInitialized { seed: Option<SeedReport> },
    /// The database was unreachable at `stage`.
    Degraded { stage: InitStage, reason: String },
}

impl InitializationOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, InitializationOutcome::Degraded { .. })
    }
}

/// Run schema creation, then seeding when the variant asks for it.
pub fn initialize_database<S>(
    store: &S,
    caps: &Capabilities,
) -> Result<InitializationOutcome, BootstrapError>
where
    S: Persistence + Seeder + ?Sized,
{
    if let Err(e) = store.ensure_schema() {
        return degrade_or_abort(InitStage::Schema, e, caps);
    }
    tracing::info!(service = caps.name, "Database schema ready");

    if !caps.requires_seeding {
        return Ok(InitializationOutcome::FullyInitialized { seed: None });
    }

    run_seed(store, caps)
}

/// Seed Runner. Only reached after the schema stage succeeded.
pub fn run_seed<S>(seeder: &S, caps: &Capabilities) -> Result<InitializationOutcome, BootstrapError>
where
    S: Seeder + ?Sized,
{
    match seeder.seed_if_empty() {
        Ok(report) => {
            tracing::info!(
                service = caps.name,
                inserted = report.inserted,
                skipped = report.skipped,
                "Baseline data seeded"
            );
            Ok(InitializationOutcome::FullyInitialized { seed: Some(report) })
        }
        Err(e) => degrade_or_abort(InitStage::Seed, e, caps),
    }
}

/// The single place a connectivity failure is caught and turned into a
/// degraded outcome. Everything else is fatal.
fn degrade_or_abort(
    stage: InitStage,
    error: PersistenceError,
    caps: &Capabilities,
) -> Result<InitializationOutcome, BootstrapError> {
    match error {
        PersistenceError::Connectivity(reason) => {
            tracing::error!(
                service = caps.name,
                %stage,
                error = %reason,
                "Database connection failed during startup; serving in degraded mode"
            );
            Ok(InitializationOutcome::Degraded { stage, reason })
        }
        source => Err(BootstrapError::Initialization { stage, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PersistenceResult, StoredCategory, StoredRecipe, StoredRole};
    use crate::variant::Variant;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedStore {
        schema: Option<PersistenceError>,
        seed: Option<PersistenceError>,
        seed_calls: AtomicUsize,
    }

    impl Persistence for ScriptedStore {
        fn ensure_schema(&self) -> PersistenceResult<()> {
            self.schema.clone().map_or(Ok(()), Err)
        }

        fn ping(&self) -> PersistenceResult<()> {
            Ok(())
        }

        fn list_recipes(&self) -> PersistenceResult<Vec<StoredRecipe>> {
            Ok(Vec::new())
        }

        fn list_roles(&self) -> PersistenceResult<Vec<StoredRole>> {
            Ok(Vec::new())
        }

        fn list_categories(&self) -> PersistenceResult<Vec<StoredCategory>> {
            Ok(Vec::new())
        }
    }

    impl Seeder for ScriptedStore {
        fn seed_if_empty(&self) -> PersistenceResult<SeedReport> {
            self.seed_calls.fetch_add(1, Ordering::SeqCst);
            match &self.seed {
                Some(e) => Err(e.clone()),
                None => Ok(SeedReport {
                    inserted: 2,
                    skipped: 0,
                }),
            }
        }
    }

    #[test]
    fn recipe_variant_never_seeds() {
        let store = ScriptedStore::default();
        let outcome = initialize_database(&store, &Variant::Recipe.capabilities()).unwrap();
        assert_eq!(outcome, InitializationOutcome::FullyInitialized { seed: None });
        assert_eq!(store.seed_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn user_variant_seeds_once_after_schema() {
        let store = ScriptedStore::default();
        let outcome = initialize_database(&store, &Variant::User.capabilities()).unwrap();
        assert_eq!(
            outcome,
            InitializationOutcome::FullyInitialized {
                seed: Some(SeedReport {
                    inserted: 2,
                    skipped: 0
                })
            }
        );
        assert_eq!(store.seed_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schema_connectivity_failure_degrades_and_skips_seed() {
        let store = ScriptedStore {
            schema: Some(PersistenceError::connectivity("unable to connect")),
            ..Default::default()
        };
        let outcome = initialize_database(&store, &Variant::User.capabilities()).unwrap();
        assert_eq!(
            outcome,
            InitializationOutcome::Degraded {
                stage: InitStage::Schema,
                reason: "unable to connect".to_string()
            }
        );
        assert_eq!(store.seed_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn schema_other_failure_is_fatal() {
        let store = ScriptedStore {
            schema: Some(PersistenceError::other("corrupted page")),
            ..Default::default()
        };
        let err = initialize_database(&store, &Variant::Recipe.capabilities()).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Initialization {
                stage: InitStage::Schema,
                ..
            }
        ));
    }

    #[test]
    fn seed_connectivity_failure_degrades() {
        let store = ScriptedStore {
            seed: Some(PersistenceError::connectivity("connection reset")),
            ..Default::default()
        };
        let outcome = initialize_database(&store, &Variant::User.capabilities()).unwrap();
        assert!(outcome.is_degraded());
    }

    #[test]
    fn seed_other_failure_is_fatal() {
        let store = ScriptedStore {
            seed: Some(PersistenceError::other("constraint violated")),
            ..Default::default()
        };
        let err = initialize_database(&store, &Variant::User.capabilities()).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Initialization {
                stage: InitStage::Seed,
                ..
            }
        ));
    }
}
