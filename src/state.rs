// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::storage::Store;

/// Shared state handed to request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: &'static str,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(service: &'static str, store: Arc<dyn Store>) -> Self {
        Self { service, store }
    }
}
