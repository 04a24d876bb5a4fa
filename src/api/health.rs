// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::TokenPayload;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Token issue/verify round trip.
    pub tokens: String,
    /// Credential seal/open round trip.
    pub credentials: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn check_tokens(state: &AppState) -> bool {
    state
        .tokens
        .create_token(TokenPayload::new(), None)
        .and_then(|token| state.tokens.validate_token(&token))
        .is_ok()
}

fn check_credentials(state: &AppState) -> bool {
    const PROBE: &[u8] = b"health-probe";
    state
        .cipher
        .encrypt(PROBE)
        .ok()
        .and_then(|sealed| state.cipher.compare(PROBE, &sealed).ok())
        .unwrap_or(false)
}

fn label(ok: bool) -> String {
    let label = if ok { "ok" } else { "failing" };
    label.to_string()
}

/// Health check endpoint handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let tokens_ok = check_tokens(&state);
    let credentials_ok = check_credentials(&state);
    let all_ok = tokens_ok && credentials_ok;

    if !all_ok {
        tracing::error!(tokens_ok, credentials_ok, "Health check failed");
    }

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            tokens: label(tokens_ok),
            credentials: label(credentials_ok),
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
/// Does not check dependencies - use `/health` for that.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
