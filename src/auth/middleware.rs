// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Middleware counterparts of the extractors in `extractor.rs`, for applying
//! a gate to an entire router subtree:
//!
//! ```rust,ignore
//! let admin = Router::new()
//!     .route("/admin/overview", get(overview))
//!     .route_layer(middleware::from_fn_with_state(
//!         RoleGuard::new(gate.clone(), RoleGate::any_of(&[Role::Admin])),
//!         require_role,
//!     ));
//! ```
//!
//! Both insert the [`AuthenticatedIdentity`] into request extensions, where
//! the `Auth` extractor picks it up without validating the token again.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::gate::{AuthGate, GateRejection, RoleGate};
use super::identity::AuthenticatedIdentity;

fn authenticate_request(
    gate: &AuthGate,
    request: &Request,
) -> Result<AuthenticatedIdentity, GateRejection> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| GateRejection::Unauthorized))
        .transpose()?;
    gate.authenticate(header)
}

/// Strict authentication middleware.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_request(&gate, &request) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// State for [`require_role`]: the gate plus the route's allow-list.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    pub gate: AuthGate,
    pub roles: RoleGate,
}

impl RoleGuard {
    pub fn new(gate: AuthGate, roles: RoleGate) -> Self {
        Self { gate, roles }
    }
}

/// Strict authentication followed by a role check.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match authenticate_request(&guard.gate, &request) {
        Ok(identity) => identity,
        Err(rejection) => return rejection.into_response(),
    };

    if let Err(rejection) = guard.roles.authorize(Some(&identity)) {
        tracing::info!(
            user_id = identity.user_id_string().as_deref(),
            path = %request.uri().path(),
            "Role check failed"
        );
        return rejection.into_response();
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}
