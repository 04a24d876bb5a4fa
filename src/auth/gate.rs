// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request gates.
//!
//! Framework-agnostic checks run before a handler:
//!
//! - [`AuthGate::authenticate`]: strict, any token failure rejects
//! - [`AuthGate::authenticate_optional`]: lenient, failure yields no identity
//! - [`RoleGate::authorize`]: allow-list over the caller's role claim
//!
//! Rejections carry no detail about why a token failed. The Axum extractors
//! and middleware in this module's siblings wrap these functions.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use super::identity::AuthenticatedIdentity;
use super::roles::{Role, RoleMatch};
use super::token::TokenService;

/// Why a gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions for this operation")]
    Forbidden,
}

#[derive(Serialize)]
struct GateRejectionBody {
    error: String,
    error_code: String,
}

impl GateRejection {
    pub fn error_code(&self) -> &'static str {
        match self {
            GateRejection::Unauthorized => "unauthorized",
            GateRejection::Forbidden => "forbidden",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GateRejection::Unauthorized => StatusCode::UNAUTHORIZED,
            GateRejection::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(GateRejectionBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

/// Authenticates requests against the token service.
#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Strict gate over a raw `Authorization` header value.
    pub fn authenticate(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedIdentity, GateRejection> {
        match self.tokens.validate_token_from_header(header) {
            Ok(claims) => {
                let identity = AuthenticatedIdentity::from_claims(claims);
                debug!(
                    user_id = identity.user_id_string().as_deref(),
                    role = identity.role.as_ref().and_then(|r| r.as_str()),
                    "Request authenticated"
                );
                Ok(identity)
            }
            Err(e) => {
                debug!(reason = e.error_code(), "Request not authenticated");
                Err(GateRejection::Unauthorized)
            }
        }
    }

    /// Lenient gate: an absent or bad token means an anonymous caller.
    pub fn authenticate_optional(&self, header: Option<&str>) -> Option<AuthenticatedIdentity> {
        self.authenticate(header).ok()
    }
}

/// Allow-list of roles for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
    allowed: Vec<Role>,
    policy: RoleMatch,
}

impl RoleGate {
    /// Allow any of `roles`, compared case-insensitively.
    pub fn any_of(roles: &[Role]) -> Self {
        Self {
            allowed: roles.to_vec(),
            policy: RoleMatch::CaseInsensitive,
        }
    }

    /// Require the canonical lowercase spelling.
    pub fn case_sensitive(mut self) -> Self {
        self.policy = RoleMatch::CaseSensitive;
        self
    }

    pub fn policy(&self) -> RoleMatch {
        self.policy
    }

    /// Decide whether `identity` may proceed.
    ///
    /// No identity or no role claim is `Unauthorized`; a role claim that is
    /// not a string, or names no allowed role, is `Forbidden`.
    pub fn authorize(&self, identity: Option<&AuthenticatedIdentity>) -> Result<(), GateRejection> {
        let claim = identity
            .and_then(|id| id.role.as_ref())
            .ok_or(GateRejection::Unauthorized)?;

        let Some(raw) = claim.as_str() else {
            debug!("Role claim is not a string");
            return Err(GateRejection::Forbidden);
        };

        match Role::parse(raw, self.policy) {
            Some(role) if self.allowed.contains(&role) => Ok(()),
            _ => {
                debug!(role = raw, allowed = ?self.allowed, "Role not permitted");
                Err(GateRejection::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::json;

    use super::*;
    use crate::auth::claims::{Claims, NumericDate, TokenPayload};
    use crate::auth::roles::RoleClaim;
    use crate::config::TokenSettings;

    fn gate() -> AuthGate {
        let settings = TokenSettings::new("gate-secret-0123456789abcdef01234")
            .with_refresh_secret("gate-refresh-0123456789abcdef0123");
        AuthGate::new(Arc::new(TokenService::new(&settings).unwrap()))
    }

    fn with_role(role: impl Into<RoleClaim>) -> AuthenticatedIdentity {
        AuthenticatedIdentity::from_claims(Claims {
            issuer: "oak-auth".to_string(),
            issued_at: NumericDate::from_millis(0),
            expires_at: NumericDate::from_millis(1),
            kind: None,
            payload: TokenPayload::new().with_user_id(1).with_role(role),
        })
    }

    fn without_role() -> AuthenticatedIdentity {
        AuthenticatedIdentity::from_claims(Claims {
            issuer: "oak-auth".to_string(),
            issued_at: NumericDate::from_millis(0),
            expires_at: NumericDate::from_millis(1),
            kind: None,
            payload: TokenPayload::new().with_user_id(1),
        })
    }

    #[test]
    fn strict_gate_accepts_valid_token() {
        let gate = gate();
        let token = gate
            .tokens()
            .create_token(TokenPayload::new().with_user_id(9).with_role(Role::Admin), None)
            .unwrap();
        let identity = gate.authenticate(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.user_id_i64(), Some(9));
        assert!(identity.is_admin());
    }

    #[test]
    fn strict_gate_collapses_failures_to_unauthorized() {
        let gate = gate();
        for header in [None, Some(""), Some("Token abc"), Some("Bearer abc")] {
            assert_eq!(gate.authenticate(header), Err(GateRejection::Unauthorized));
        }

        let refresh = gate
            .tokens()
            .create_refresh_token(TokenPayload::new().with_user_id(9))
            .unwrap();
        assert_eq!(
            gate.authenticate(Some(&format!("Bearer {refresh}"))),
            Err(GateRejection::Unauthorized)
        );
    }

    #[test]
    fn optional_gate_yields_none_on_failure() {
        let gate = gate();
        assert!(gate.authenticate_optional(None).is_none());
        assert!(gate.authenticate_optional(Some("Bearer nope")).is_none());

        let token = gate.tokens().create_token(TokenPayload::new(), None).unwrap();
        assert!(gate
            .authenticate_optional(Some(&format!("Bearer {token}")))
            .is_some());
    }

    #[test]
    fn role_gate_policy_decides_on_case() {
        let identity = with_role("Admin");
        assert_eq!(
            RoleGate::any_of(&[Role::Admin]).authorize(Some(&identity)),
            Ok(())
        );
        assert_eq!(
            RoleGate::any_of(&[Role::Admin])
                .case_sensitive()
                .authorize(Some(&identity)),
            Err(GateRejection::Forbidden)
        );
        assert_eq!(
            RoleGate::any_of(&[Role::Admin])
                .case_sensitive()
                .authorize(Some(&with_role("admin"))),
            Ok(())
        );
    }

    #[test]
    fn role_gate_without_identity_or_role_is_unauthorized() {
        let gate = RoleGate::any_of(&[Role::Admin]);
        assert_eq!(gate.authorize(None), Err(GateRejection::Unauthorized));
        assert_eq!(
            gate.authorize(Some(&without_role())),
            Err(GateRejection::Unauthorized)
        );
    }

    #[test]
    fn role_gate_forbids_wrong_or_malformed_roles() {
        let gate = RoleGate::any_of(&[Role::Admin]);
        assert_eq!(
            gate.authorize(Some(&with_role(Role::Customer))),
            Err(GateRejection::Forbidden)
        );
        assert_eq!(
            gate.authorize(Some(&with_role("superuser"))),
            Err(GateRejection::Forbidden)
        );
        assert_eq!(
            gate.authorize(Some(&with_role(RoleClaim::from(json!(1))))),
            Err(GateRejection::Forbidden)
        );
    }

    #[test]
    fn signed_null_role_is_forbidden() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let gate = gate();
        let now = chrono::Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &json!({"iss": "oak-auth", "iat": now, "exp": now + 60, "user_id": 1, "role": null}),
            &EncodingKey::from_secret(b"gate-secret-0123456789abcdef01234"),
        )
        .unwrap();

        let identity = gate.authenticate(Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(
            RoleGate::any_of(&[Role::Admin]).authorize(Some(&identity)),
            Err(GateRejection::Forbidden)
        );
    }

    #[test]
    fn role_gate_allows_any_listed_role() {
        let gate = RoleGate::any_of(&[Role::Admin, Role::Customer]);
        assert_eq!(gate.authorize(Some(&with_role("customer"))), Ok(()));
        assert_eq!(
            RoleGate::any_of(&[]).authorize(Some(&with_role("admin"))),
            Err(GateRejection::Forbidden)
        );
    }

    #[tokio::test]
    async fn rejection_body_is_generic() {
        let response = GateRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthorized");
        assert_eq!(body["error"], "Authentication required");

        assert_eq!(
            GateRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
