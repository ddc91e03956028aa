// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User service: bearer token authentication and baseline seeding.

use std::process::ExitCode;

use recipe_app_server::{bootstrap, variant::Variant};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap::run(Variant::User).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
