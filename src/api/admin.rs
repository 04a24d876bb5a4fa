// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! Both routes sit behind the `require_role` middleware (see `api::router`):
//!
//! - `/v1/admin/overview` accepts the admin role in any letter case
//! - `/v1/admin/audit` accepts only the canonical `admin` spelling

use axum::{extract::State, Json};

use crate::{
    auth::{Auth, Role},
    models::{AdminOverviewResponse, AuditResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/admin/overview",
    tag = "Admin",
    responses(
        (status = 200, body = AdminOverviewResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn overview(
    Auth(identity): Auth,
    State(state): State<AppState>,
) -> Json<AdminOverviewResponse> {
    let users = state.users.read().await;
    Json(AdminOverviewResponse {
        total_users: users.len(),
        admins: users.count_by_role(Role::Admin),
        customers: users.count_by_role(Role::Customer),
        requested_by: identity.user_id_string(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/admin/audit",
    tag = "Admin",
    responses(
        (status = 200, body = AuditResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Role claim is not exactly `admin`")
    ),
    security(("bearer_auth" = []))
)]
pub async fn audit(Auth(identity): Auth, State(state): State<AppState>) -> Json<AuditResponse> {
    tracing::info!(
        user_id = identity.user_id_string().as_deref(),
        "Token policy audited"
    );
    Json(AuditResponse {
        issuer: state.tokens.issuer().to_string(),
        access_ttl_seconds: state.tokens.access_ttl().as_secs(),
        refresh_ttl_seconds: state.tokens.refresh_ttl().as_secs(),
        requested_by: identity.user_id_string(),
    })
}
