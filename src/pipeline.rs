// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Pipeline Activation
//!
//! Stages run in this order for every request:
//!
//! 1. Documentation UI (development only)
//! 2. CORS, exactly one policy
//! 3. HTTPS redirection
//! 4. Authentication, then authorization (User service only)
//! 5. Routing
//!
//! CORS and redirection sit in front of authentication so that
//! unauthenticated preflight requests are answered instead of rejected.
//! Request id and tracing layers wrap the whole pipeline.

use axum::{
    extract::Request,
    http::{header::HOST, HeaderName},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::auth::middleware::{authenticate, require_authenticated};
use crate::config::EnvironmentMode;
use crate::policy::{CorsPolicyName, PolicySet};
use crate::state::AppState;
use crate::variant::Capabilities;

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    DocumentationUi,
    Cors(CorsPolicyName),
    HttpsRedirection,
    Authentication,
    Authorization,
    Routing,
}

/// The live router and the stages it was built from, outermost first.
pub struct ActivatedPipeline {
    pub stages: Vec<PipelineStage>,
    pub router: Router,
}

/// Stage plan for a service, outermost first.
pub fn plan(mode: EnvironmentMode, caps: &Capabilities, policies: &PolicySet) -> Vec<PipelineStage> {
    let mut stages = Vec::with_capacity(6);

    if mode.is_development() {
        stages.push(PipelineStage::DocumentationUi);
    }
    stages.push(PipelineStage::Cors(policies.active_cors(mode).name));
    stages.push(PipelineStage::HttpsRedirection);

    if caps.requires_authentication {
        // Without token settings nobody authenticates, and protected routes
        // stay closed.
        if policies.token_validation.is_some() {
            stages.push(PipelineStage::Authentication);
        }
        stages.push(PipelineStage::Authorization);
    }

    stages.push(PipelineStage::Routing);
    stages
}

/// Build the router for `plan`.
///
/// Layers added later wrap earlier ones, so the stages are applied from the
/// innermost (routing) outwards.
pub fn activate(
    mode: EnvironmentMode,
    caps: &Capabilities,
    policies: &PolicySet,
    state: AppState,
) -> ActivatedPipeline {
    let stages = plan(mode, caps, policies);
    let routes = api::routes(caps.variant);

    let mut protected = routes.protected;
    if stages.contains(&PipelineStage::Authorization) {
        protected = protected.route_layer(middleware::from_fn(require_authenticated));
    }

    let mut router: Router = routes.public.merge(protected).with_state(state);

    if stages.contains(&PipelineStage::Authentication) {
        if let Some(tokens) = policies.token_validation.clone() {
            router = router.layer(middleware::from_fn_with_state(tokens, authenticate));
        }
    }

    router = router
        .layer(middleware::from_fn(https_redirect))
        .layer(policies.active_cors(mode).layer());

    if stages.contains(&PipelineStage::DocumentationUi) {
        router = router.merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, api::openapi(caps.variant)));
    }

    let router = router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    tracing::info!(
        service = caps.name,
        environment = %mode,
        cors = %policies.active_cors(mode).name,
        ?stages,
        "Request pipeline activated"
    );

    ActivatedPipeline { stages, router }
}

/// Redirect requests that reached the edge over plain HTTP.
///
/// TLS terminates at the front end, so the original scheme comes from
/// `X-Forwarded-Proto`. Requests without it are served as-is.
pub async fn https_redirect(request: Request, next: Next) -> Response {
    let plain_http = request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("http"));

    let host = request.headers().get(HOST).and_then(|v| v.to_str().ok());

    match (plain_http, host) {
        (true, Some(host)) => {
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            Redirect::temporary(&format!("https://{host}{path}")).into_response()
        }
        _ => next.run(request).await,
    }
}
