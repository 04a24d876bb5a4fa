// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and token refresh.

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::{
    auth::TokenPayload,
    error::ApiError,
    models::{timestamp, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Session",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Unknown user or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = {
        let users = state.users.read().await;
        users.find_by_login(&request.email_or_username).cloned()
    };
    let Some(user) = user else {
        state.cipher.compare_decoy(request.password.as_bytes());
        info!("Login attempt for unknown user");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !state
        .cipher
        .compare(request.password.as_bytes(), &user.password)?
    {
        warn!(user_id = %user.user_id, "Login attempt with wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let payload = TokenPayload::new()
        .with_user_id(user.user_id.to_string())
        .with_username(user.username.as_str())
        .with_email(user.email.as_str())
        .with_role(user.role);

    let access = state.tokens.issue_access(payload.clone(), None)?;
    let refresh = state.tokens.issue_refresh(payload)?;

    info!(user_id = %user.user_id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        expires_at: timestamp(access.expires_at()),
        access_token: access.into_string(),
        refresh_token: refresh.into_string(),
        user_id: user.user_id.to_string(),
        user_role: user.role,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    tag = "Session",
    responses(
        (status = 200, body = RefreshResponse),
        (status = 401, description = "Refresh token invalid, expired or not a refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access = state.tokens.refresh_signed(&request.refresh_token)?;
    Ok(Json(RefreshResponse {
        expires_at: timestamp(access.expires_at()),
        access_token: access.into_string(),
    }))
}
