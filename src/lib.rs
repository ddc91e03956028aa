// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipe App Server - Resilient Service Bootstrap
//!
//! Two HTTP services, Recipe and User, built from one startup sequence.
//! Configuration is validated before anything is wired, and an unreachable
//! database degrades the service instead of stopping it.
//!
//! ## Modules
//!
//! - `config` - Configuration loading (`.env` + environment) and validation
//! - `policy` - CORS policies and the token validation descriptor
//! - `registry` - Dependency registration and the command registry
//! - `init` - Database initialization and seeding
//! - `pipeline` - Request pipeline activation
//! - `bootstrap` - The startup sequence and server loop
//! - `api` - HTTP handlers (Axum)
//! - `auth` - Bearer token authentication (HS256 JWT)
//! - `storage` - Embedded redb store

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod init;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod variant;
