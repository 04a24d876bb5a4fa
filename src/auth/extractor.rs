// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is AuthenticatedIdentity
//! }
//! ```
//!
//! Both extractors work with any state that can hand out an [`AuthGate`]
//! through `FromRef`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::gate::{AuthGate, GateRejection};
use super::identity::AuthenticatedIdentity;

/// Raw `Authorization` header value.
///
/// A value that is not visible ASCII cannot be a bearer token and is refused
/// outright rather than treated as absent.
fn authorization_header(parts: &Parts) -> Result<Option<&str>, GateRejection> {
    parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| GateRejection::Unauthorized))
        .transpose()
}

/// Extractor for authenticated callers.
///
/// Validates the bearer token from the Authorization header, unless the
/// `authenticate` middleware already did so for this request.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(Auth(identity): Auth) -> Json<IdentityResponse> {
///     // identity.user_id contains the caller's subject id
///     // identity.role contains the role claim as issued
/// }
/// ```
pub struct Auth(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for Auth
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the identity
        if let Some(identity) = parts.extensions.get::<AuthenticatedIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let header = authorization_header(parts)?;
        AuthGate::from_ref(state).authenticate(header).map(Auth)
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid authentication is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedIdentity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AuthGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(identity)) => Ok(OptionalAuth(Some(identity))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
