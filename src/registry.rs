// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dependency registration.
//!
//! Pure composition: the registry constructs collaborators and threads them
//! through the remaining stages by value. Nothing here touches the network
//! or the database.

use std::sync::Arc;

use crate::config::{DatabaseSettings, ValidatedConfig};
use crate::policy::PolicySet;
use crate::state::AppState;
use crate::storage::{RedbStore, Store};
use crate::variant::{Capabilities, HandlerScope};

/// Builds the backing store from validated database settings.
pub type StoreFactory = Box<dyn FnOnce(&DatabaseSettings) -> Arc<dyn Store> + Send>;

/// Default factory: a lazily connected redb store.
pub fn redb_store_factory() -> StoreFactory {
    Box::new(|settings: &DatabaseSettings| {
        Arc::new(RedbStore::new(settings.path.clone())) as Arc<dyn Store>
    })
}

/// Handler scopes registered with the command dispatcher.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    scopes: Vec<HandlerScope>,
}

impl CommandRegistry {
    pub fn register_scope(&mut self, scope: HandlerScope) {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
    }

    pub fn scopes(&self) -> &[HandlerScope] {
        &self.scopes
    }
}

/// Everything wired for one process instance.
pub struct ServiceRegistry {
    pub capabilities: Capabilities,
    pub config: ValidatedConfig,
    pub policies: PolicySet,
    pub store: Arc<dyn Store>,
    pub commands: CommandRegistry,
}

impl ServiceRegistry {
    pub fn register(
        capabilities: Capabilities,
        config: ValidatedConfig,
        policies: PolicySet,
        store_factory: StoreFactory,
    ) -> Self {
        let store = store_factory(config.database());

        let mut commands = CommandRegistry::default();
        commands.register_scope(capabilities.handler_scope);

        tracing::debug!(
            service = capabilities.name,
            scope = capabilities.handler_scope.name,
            handlers = capabilities.handler_scope.handlers.len(),
            authentication = policies.token_validation.is_some(),
            "Services registered"
        );

        Self {
            capabilities,
            config,
            policies,
            store,
            commands,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.capabilities.name, Arc::clone(&self.store))
    }
}
