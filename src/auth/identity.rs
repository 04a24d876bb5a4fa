// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authenticated caller, as seen by a handler.

use super::claims::{Claims, SubjectId};
use super::roles::{Role, RoleClaim, RoleMatch};

/// Request-scoped view of a validated access token.
///
/// Built once per request by the gate and handed to the handler as an
/// argument. It is never stored beyond the request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedIdentity {
    pub user_id: Option<SubjectId>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Role claim as issued, so either comparison policy can be applied.
    pub role: Option<RoleClaim>,
    /// Every claim of the token, reserved fields included.
    pub claims: Claims,
}

impl AuthenticatedIdentity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.payload.user_id.clone(),
            username: claims.payload.username.clone(),
            email: claims.payload.email.clone(),
            role: claims.payload.role.clone(),
            claims,
        }
    }

    /// Subject id as an integer, when it is one.
    pub fn user_id_i64(&self) -> Option<i64> {
        self.user_id.as_ref().and_then(SubjectId::as_i64)
    }

    /// Subject id in canonical string form.
    pub fn user_id_string(&self) -> Option<String> {
        self.user_id.as_ref().map(ToString::to_string)
    }

    /// Resolve the role claim under `policy`.
    pub fn role(&self, policy: RoleMatch) -> Option<Role> {
        self.role.as_ref().and_then(|claim| claim.role(policy))
    }

    /// Check if the caller holds `role` (case-insensitive).
    pub fn has_role(&self, role: Role) -> bool {
        self.role(RoleMatch::CaseInsensitive) == Some(role)
    }

    /// Check if the caller holds any of the given roles (case-insensitive).
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role(RoleMatch::CaseInsensitive)
            .is_some_and(|role| roles.contains(&role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}
