// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// User roles for authorization.
///
/// - `Admin` - Back-office staff with access to administrative endpoints
/// - `Customer` - Account holder, can only act on their own data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative access
    Admin,
    /// Regular account holder
    Customer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Customer];

    /// Canonical (lowercase) name, as issued in tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }

    /// Parse a raw role name under the given comparison policy.
    ///
    /// Unknown names yield `None`; there is no fallback role.
    pub fn parse(raw: &str, policy: RoleMatch) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| policy.matches(raw, role.as_str()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a role claim is compared against an allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleMatch {
    /// `"Admin"` matches `admin`.
    #[default]
    CaseInsensitive,
    /// Only the canonical lowercase spelling matches.
    CaseSensitive,
}

impl RoleMatch {
    pub fn matches(self, candidate: &str, expected: &str) -> bool {
        match self {
            RoleMatch::CaseInsensitive => candidate.eq_ignore_ascii_case(expected),
            RoleMatch::CaseSensitive => candidate == expected,
        }
    }
}

/// The `role` claim exactly as carried by a token.
///
/// Kept raw so that a malformed value (a number, an object) can be told
/// apart from a missing one, and so both comparison policies see the
/// original spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleClaim(Value);

impl RoleClaim {
    /// The claim as a string, or `None` if it is not one.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Resolve the claim to a known role under `policy`.
    pub fn role(&self, policy: RoleMatch) -> Option<Role> {
        self.as_str().and_then(|raw| Role::parse(raw, policy))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Role> for RoleClaim {
    fn from(role: Role) -> Self {
        RoleClaim(Value::String(role.as_str().to_owned()))
    }
}

impl From<&str> for RoleClaim {
    fn from(raw: &str) -> Self {
        RoleClaim(Value::String(raw.to_owned()))
    }
}

impl From<Value> for RoleClaim {
    fn from(raw: Value) -> Self {
        RoleClaim(raw)
    }
}
