// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::{
    auth::{Auth, OptionalAuth},
    models::{GreetingResponse, IdentityResponse},
};

#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Identity",
    responses(
        (status = 200, body = IdentityResponse),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(Auth(identity): Auth) -> Json<IdentityResponse> {
    Json(IdentityResponse::from(&identity))
}

#[utoipa::path(
    get,
    path = "/v1/greeting",
    tag = "Identity",
    responses((status = 200, body = GreetingResponse))
)]
pub async fn greeting(OptionalAuth(identity): OptionalAuth) -> Json<GreetingResponse> {
    let name = identity
        .as_ref()
        .and_then(|id| id.username.clone().or_else(|| id.user_id_string()));

    Json(match name {
        Some(name) => GreetingResponse {
            message: format!("Welcome back, {name}"),
            authenticated: true,
        },
        None if identity.is_some() => GreetingResponse {
            message: "Welcome back".to_string(),
            authenticated: true,
        },
        None => GreetingResponse {
            message: "Hello, stranger".to_string(),
            authenticated: false,
        },
    })
}
