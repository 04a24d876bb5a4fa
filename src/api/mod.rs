// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::header::AUTHORIZATION,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_role, Role, RoleGate, RoleGuard},
    models::{
        AdminOverviewResponse, AuditResponse, GreetingResponse, IdentityResponse, LoginRequest,
        LoginResponse, RefreshRequest, RefreshResponse,
    },
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod me;
pub mod session;

pub fn router(state: AppState) -> Router {
    // Admin roles compared in any letter case.
    let overview = Router::new()
        .route("/admin/overview", get(admin::overview))
        .route_layer(from_fn_with_state(
            RoleGuard::new(state.gate.clone(), RoleGate::any_of(&[Role::Admin])),
            require_role,
        ));

    // Audit requires the canonical spelling.
    let audit = Router::new()
        .route("/admin/audit", get(admin::audit))
        .route_layer(from_fn_with_state(
            RoleGuard::new(
                state.gate.clone(),
                RoleGate::any_of(&[Role::Admin]).case_sensitive(),
            ),
            require_role,
        ));

    let v1_routes = Router::new()
        .route("/auth/login", post(session::login))
        .route("/auth/refresh", post(session::refresh))
        .route("/me", get(me::me))
        .route("/greeting", get(me::greeting))
        .merge(overview)
        .merge(audit)
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Keep bearer tokens out of traces.
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION]))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        session::login,
        session::refresh,
        me::me,
        me::greeting,
        admin::overview,
        admin::audit
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            IdentityResponse,
            GreetingResponse,
            AdminOverviewResponse,
            AuditResponse,
            Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Session", description = "Login and token refresh"),
        (name = "Identity", description = "The authenticated caller"),
        (name = "Admin", description = "Back-office endpoints")
    )
)]
struct ApiDoc;
