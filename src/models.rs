// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize` and/or `Deserialize`, and
//! `ToSchema` for automatic JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Session**: Login and token refresh
//! - **Identity**: The authenticated caller as seen by the server
//! - **Admin**: Back-office summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::{AuthenticatedIdentity, NumericDate, Role};

/// Convert a token timestamp for display.
pub fn timestamp(date: NumericDate) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(date.as_millis())
}

// =============================================================================
// Session Models
// =============================================================================

/// Credentials presented at login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email address.
    pub email_or_username: String,
    pub password: String,
}

/// Tokens issued at login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Short-lived bearer token for API calls.
    pub access_token: String,
    /// Long-lived token for `POST /v1/auth/refresh`.
    pub refresh_token: String,
    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: String,
    pub user_role: Role,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Identity Models
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Role claim exactly as issued.
    #[schema(value_type = Option<Object>)]
    pub role: Option<Value>,
    pub issuer: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AuthenticatedIdentity> for IdentityResponse {
    fn from(identity: &AuthenticatedIdentity) -> Self {
        Self {
            user_id: identity.user_id_string(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            role: identity.role.as_ref().map(|r| r.as_value().clone()),
            issuer: identity.claims.issuer.clone(),
            issued_at: timestamp(identity.claims.issued_at),
            expires_at: timestamp(identity.claims.expires_at),
        }
    }
}

/// Greeting for anonymous or signed-in callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GreetingResponse {
    pub message: String,
    pub authenticated: bool,
}

// =============================================================================
// Admin Models
// =============================================================================

/// User directory summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminOverviewResponse {
    pub total_users: usize,
    pub admins: usize,
    pub customers: usize,
    /// Who asked.
    pub requested_by: Option<String>,
}

/// Token policy in force, for auditors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditResponse {
    pub issuer: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub requested_by: Option<String>,
}
