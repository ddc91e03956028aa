// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Service Bootstrap
//!
//! One routine starts either service; [`Capabilities`] switch the
//! variant-specific steps on and off.
//!
//! ```text
//! load config -> validate -> select policies -> register services
//!     -> initialize database (+ seed) -> activate pipeline -> bind
//! ```
//!
//! Each stage completes, aborts startup with a [`BootstrapError`], or (database
//! stages only) continues degraded. A fatal error is returned before any
//! listener is bound.

use std::{net::SocketAddr, time::Duration};

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;

use crate::config::{validate, ConfigLoader, ConfigView, ServerSettings};
use crate::error::BootstrapError;
use crate::init::{initialize_database, InitializationOutcome};
use crate::pipeline::{self, PipelineStage};
use crate::policy::PolicySet;
use crate::registry::{redb_store_factory, ServiceRegistry, StoreFactory};
use crate::telemetry::{self, TracingSettings};
use crate::variant::{Capabilities, Variant};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// A fully prepared service that has not bound a listener yet.
pub struct Bootstrapped {
    pub router: Router,
    pub registry: ServiceRegistry,
    pub outcome: InitializationOutcome,
    pub stages: Vec<PipelineStage>,
}

/// Run every startup stage up to, but not including, binding.
///
/// `store_factory` is only called once configuration has validated.
pub fn prepare(
    caps: Capabilities,
    view: &ConfigView,
    store_factory: StoreFactory,
) -> Result<Bootstrapped, BootstrapError> {
    let config = validate(view, &caps)?;
    let mode = config.environment();
    tracing::info!(service = caps.name, environment = %mode, "Configuration validated");

    let policies = PolicySet::select(&config, &caps);
    if caps.requires_authentication && policies.token_validation.is_none() {
        tracing::warn!(service = caps.name, "No token settings; authentication disabled");
    }

    let registry = ServiceRegistry::register(caps, config, policies, store_factory);

    let outcome = initialize_database(registry.store.as_ref(), &caps)?;
    match &outcome {
        InitializationOutcome::FullyInitialized { .. } => {
            tracing::info!(service = caps.name, "Database initialized");
        }
        InitializationOutcome::Degraded { stage, .. } => {
            tracing::warn!(
                service = caps.name,
                %stage,
                "Continuing without database; requests that need it will fail"
            );
        }
    }

    let activated = pipeline::activate(mode, &caps, &registry.policies, registry.app_state());

    Ok(Bootstrapped {
        router: activated.router,
        registry,
        outcome,
        stages: activated.stages,
    })
}

/// Process entry point for a service binary.
///
/// Configuration is read before tracing starts so that logging settings in
/// the `.env` file take effect. Errors are logged here; callers only map them
/// to an exit code.
pub async fn run(variant: Variant) -> Result<(), BootstrapError> {
    let caps = variant.capabilities();

    let loaded = ConfigLoader::new().load();
    let settings = match &loaded {
        Ok(view) => TracingSettings::from_view(view),
        Err(_) => TracingSettings::from_view(&ConfigView::from_environment()),
    };
    telemetry::init_tracing(&settings);

    let result = match loaded {
        Ok(view) => start(caps, &view).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = &result {
        tracing::error!(service = caps.name, error = %e, "Service failed");
    }
    result
}

async fn start(caps: Capabilities, view: &ConfigView) -> Result<(), BootstrapError> {
    let bootstrapped = prepare(caps, view, redb_store_factory())?;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    serve(bootstrapped, shutdown).await
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn serve(bootstrapped: Bootstrapped, shutdown: CancellationToken) -> Result<(), BootstrapError> {
    let settings = bootstrapped.registry.config.server().clone();
    let addr = resolve_bind_address(&settings).await?;
    let service = bootstrapped.registry.capabilities.name;

    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            tracing::info!(service, "Shutdown requested; draining connections");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    let app = bootstrapped.router.into_make_service();
    match &settings.tls {
        Some(tls) => {
            // Another component may already have installed a provider.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(BootstrapError::Tls)?;

            tracing::info!(service, %addr, "Listening on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app)
                .await?;
        }
        None => {
            tracing::info!(service, %addr, "Listening on http://{addr}");
            axum_server::bind(addr).handle(handle).serve(app).await?;
        }
    }

    tracing::info!(service, "Server stopped");
    Ok(())
}

async fn resolve_bind_address(settings: &ServerSettings) -> Result<SocketAddr, BootstrapError> {
    let address = format!("{}:{}", settings.host, settings.port);
    let bind_error = |reason: String| BootstrapError::BindAddress {
        address: address.clone(),
        reason,
    };

    tokio::net::lookup_host((settings.host.as_str(), settings.port))
        .await
        .map_err(|e| bind_error(e.to_string()))?
        .next()
        .ok_or_else(|| bind_error("host resolved to no addresses".to_string()))
}

async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_address_resolves_default_host() {
        let settings = ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tls: None,
        };
        let addr = resolve_bind_address(&settings).await.unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn serve_returns_after_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.redb");
        let view = ConfigView::from_layers(
            Vec::new(),
            [
                (
                    "ConnectionStrings__DefaultConnection".to_string(),
                    path.display().to_string(),
                ),
                ("HOST".to_string(), "127.0.0.1".to_string()),
                ("PORT".to_string(), "0".to_string()),
            ],
        );
        let bootstrapped = prepare(Variant::Recipe.capabilities(), &view, redb_store_factory()).unwrap();

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), serve(bootstrapped, shutdown))
            .await
            .expect("server did not stop")
            .unwrap();
    }
}
