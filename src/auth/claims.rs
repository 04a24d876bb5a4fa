// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims.
//!
//! A token carries three kinds of fields:
//!
//! - reserved fields set by the issuer on every issuance (`iss`, `iat`, `exp`
//!   and, on refresh tokens only, `type`)
//! - a typed subject record ([`TokenPayload`]): `user_id`, `username`,
//!   `email`, `role`
//! - a bounded map of caller-defined extension fields ([`ExtraClaims`])
//!
//! Extension fields can never shadow reserved or typed names.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::roles::{Role, RoleClaim};

/// Issuer claim name.
pub const CLAIM_ISSUER: &str = "iss";
/// Issued-at claim name.
pub const CLAIM_ISSUED_AT: &str = "iat";
/// Expires-at claim name.
pub const CLAIM_EXPIRES_AT: &str = "exp";
/// Token-kind claim name.
pub const CLAIM_TOKEN_KIND: &str = "type";

/// Claims owned by the issuer.
pub const RESERVED_CLAIMS: [&str; 4] = [
    CLAIM_ISSUER,
    CLAIM_ISSUED_AT,
    CLAIM_EXPIRES_AT,
    CLAIM_TOKEN_KIND,
];

/// Claims of the typed subject record.
pub const SUBJECT_CLAIMS: [&str; 4] = ["user_id", "username", "email", "role"];

/// Upper bound on caller-defined extension claims per token.
pub const MAX_EXTRA_CLAIMS: usize = 32;

/// Rejected extension claim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("claim `{0}` is reserved")]
    Reserved(String),
    #[error("at most {max} extension claims are allowed", max = MAX_EXTRA_CLAIMS)]
    TooMany,
}

// =============================================================================
// NumericDate
// =============================================================================

/// RFC 7519 NumericDate kept at millisecond precision.
///
/// Whole seconds go on the wire as integers, anything finer as fractional
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate(i64);

impl NumericDate {
    pub fn from_millis(millis: i64) -> Self {
        NumericDate(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch, rounded down.
    pub fn as_secs(&self) -> i64 {
        self.0.div_euclid(1000)
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        NumericDate(self.0.saturating_add(millis))
    }
}

impl Serialize for NumericDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 1000 == 0 {
            serializer.serialize_i64(self.0 / 1000)
        } else {
            serializer.serialize_f64(self.0 as f64 / 1000.0)
        }
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumericDateVisitor;

        impl Visitor<'_> for NumericDateVisitor {
            type Value = NumericDate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("seconds since the Unix epoch")
            }

            fn visit_i64<E: de::Error>(self, secs: i64) -> Result<NumericDate, E> {
                secs.checked_mul(1000)
                    .map(NumericDate)
                    .ok_or_else(|| E::custom("timestamp out of range"))
            }

            fn visit_u64<E: de::Error>(self, secs: u64) -> Result<NumericDate, E> {
                i64::try_from(secs)
                    .map_err(|_| E::custom("timestamp out of range"))
                    .and_then(|secs| self.visit_i64(secs))
            }

            fn visit_f64<E: de::Error>(self, secs: f64) -> Result<NumericDate, E> {
                let millis = (secs * 1000.0).round();
                if millis.is_finite() && millis.abs() < i64::MAX as f64 {
                    Ok(NumericDate(millis as i64))
                } else {
                    Err(E::custom("timestamp out of range"))
                }
            }
        }

        deserializer.deserialize_any(NumericDateVisitor)
    }
}

// =============================================================================
// Token kind
// =============================================================================

/// Which key domain a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Unknown or non-string `type` values read as "no kind" rather than failing
/// the whole token, so they surface as `NotARefreshToken` where it matters.
fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TokenKind>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw.as_ref().and_then(Value::as_str) {
        Some("refresh") => Some(TokenKind::Refresh),
        Some("access") => Some(TokenKind::Access),
        _ => None,
    })
}

// =============================================================================
// Subject id
// =============================================================================

/// Subject identifier, accepted as a JSON string or number.
///
/// Equality and display go through one canonical string form; the original
/// JSON type is kept so the claim round-trips unchanged through a refresh.
#[derive(Debug, Clone)]
pub enum SubjectId {
    Numeric(i64),
    Text(String),
}

impl SubjectId {
    /// Canonical string form.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            SubjectId::Numeric(id) => Cow::Owned(id.to_string()),
            SubjectId::Text(id) => Cow::Borrowed(id),
        }
    }

    /// Numeric form, when the id is (or spells) an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SubjectId::Numeric(id) => Some(*id),
            SubjectId::Text(id) => id.trim().parse().ok(),
        }
    }
}

impl PartialEq for SubjectId {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SubjectId {}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId::Numeric(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId::Text(id.to_owned())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        SubjectId::Text(id)
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SubjectId::Numeric(id) => serializer.serialize_i64(*id),
            SubjectId::Text(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SubjectIdVisitor;

        impl Visitor<'_> for SubjectIdVisitor {
            type Value = SubjectId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer subject id")
            }

            fn visit_str<E: de::Error>(self, id: &str) -> Result<SubjectId, E> {
                Ok(SubjectId::Text(id.to_owned()))
            }

            fn visit_string<E: de::Error>(self, id: String) -> Result<SubjectId, E> {
                Ok(SubjectId::Text(id))
            }

            fn visit_i64<E: de::Error>(self, id: i64) -> Result<SubjectId, E> {
                Ok(SubjectId::Numeric(id))
            }

            fn visit_u64<E: de::Error>(self, id: u64) -> Result<SubjectId, E> {
                i64::try_from(id)
                    .map(SubjectId::Numeric)
                    .map_err(|_| E::custom("subject id out of range"))
            }

            // Some issuers emit every number as a float.
            fn visit_f64<E: de::Error>(self, id: f64) -> Result<SubjectId, E> {
                if id.fract() == 0.0 && id.abs() < i64::MAX as f64 {
                    Ok(SubjectId::Numeric(id as i64))
                } else {
                    Err(E::custom("subject id must be an integer"))
                }
            }
        }

        deserializer.deserialize_any(SubjectIdVisitor)
    }
}

// =============================================================================
// Extension claims
// =============================================================================

/// Caller-defined claims beyond the typed subject record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraClaims(BTreeMap<String, Value>);

impl ExtraClaims {
    /// Add a claim, refusing reserved names and growth past
    /// [`MAX_EXTRA_CLAIMS`].
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<Option<Value>, ClaimError> {
        let name = name.into();
        if is_protected(&name) {
            return Err(ClaimError::Reserved(name));
        }
        if !self.0.contains_key(&name) && self.0.len() >= MAX_EXTRA_CLAIMS {
            return Err(ClaimError::TooMany);
        }
        Ok(self.0.insert(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Drop entries that would collide with issuer-owned or typed fields.
    /// Returns the names that were dropped.
    pub(crate) fn strip_protected(&mut self) -> Vec<String> {
        let dropped: Vec<String> = self.0.keys().filter(|name| is_protected(name)).cloned().collect();
        for name in &dropped {
            self.0.remove(name);
        }
        dropped
    }
}

fn is_protected(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name) || SUBJECT_CLAIMS.contains(&name)
}

// =============================================================================
// Payload & claims
// =============================================================================

/// Caller-supplied part of a token.
///
/// Subject fields are read leniently: a `user_id`, `username` or `email` of
/// the wrong JSON type projects to `None` and its raw value is kept aside so
/// it is signed again unchanged on refresh. A present `role` is kept whatever
/// its type, `null` included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TokenPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<SubjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleClaim>,
    #[serde(flatten)]
    pub extra: ExtraClaims,
    #[serde(flatten)]
    mistyped: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for TokenPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut payload = TokenPayload::default();

        if let Some(raw) = fields.remove("user_id") {
            match SubjectId::deserialize(&raw) {
                Ok(id) => payload.user_id = Some(id),
                Err(_) => payload.keep_mistyped("user_id", raw),
            }
        }
        if let Some(raw) = fields.remove("username") {
            match raw {
                Value::String(username) => payload.username = Some(username),
                raw => payload.keep_mistyped("username", raw),
            }
        }
        if let Some(raw) = fields.remove("email") {
            match raw {
                Value::String(email) => payload.email = Some(email),
                raw => payload.keep_mistyped("email", raw),
            }
        }
        payload.role = fields.remove("role").map(RoleClaim::from);
        payload.extra = ExtraClaims(fields);

        Ok(payload)
    }
}

impl TokenPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: impl Into<SubjectId>) -> Self {
        self.mistyped.remove("user_id");
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.mistyped.remove("username");
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.mistyped.remove("email");
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<RoleClaim>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Add an extension claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Result<Self, ClaimError> {
        self.extra.insert(name, value)?;
        Ok(self)
    }

    /// Raw value of a subject field that did not have its expected type.
    pub fn mistyped(&self, name: &str) -> Option<&Value> {
        self.mistyped.get(name)
    }

    fn keep_mistyped(&mut self, name: &str, raw: Value) {
        self.mistyped.insert(name.to_owned(), raw);
    }
}

/// Full claim set of a signed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "iat")]
    pub issued_at: NumericDate,
    #[serde(rename = "exp")]
    pub expires_at: NumericDate,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_kind"
    )]
    pub kind: Option<TokenKind>,
    #[serde(flatten)]
    pub payload: TokenPayload,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        match self.kind {
            Some(TokenKind::Refresh) => true,
            Some(TokenKind::Access) | None => false,
        }
    }

    /// Role claim resolved case-insensitively; `None` if absent, malformed
    /// or unknown.
    pub fn role(&self) -> Option<Role> {
        self.payload
            .role
            .as_ref()
            .and_then(|claim| claim.role(Default::default()))
    }

    /// Drop the reserved fields and keep everything the caller supplied.
    pub fn into_payload(self) -> TokenPayload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> Claims {
        Claims {
            issuer: "oak-auth".to_string(),
            issued_at: NumericDate::from_millis(1_700_000_000_000),
            expires_at: NumericDate::from_millis(1_700_000_900_250),
            kind: None,
            payload: TokenPayload::new()
                .with_user_id(42)
                .with_username("ana")
                .with_email("ana@example.com")
                .with_role(Role::Customer)
                .with_claim("tenant", json!("north"))
                .unwrap(),
        }
    }

    #[test]
    fn claims_serialize_flat() {
        let value = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(
            value,
            json!({
                "iss": "oak-auth",
                "iat": 1_700_000_000,
                "exp": 1_700_000_900.25,
                "user_id": 42,
                "username": "ana",
                "email": "ana@example.com",
                "role": "customer",
                "tenant": "north",
            })
        );
    }

    #[test]
    fn claims_deserialize_splits_reserved_typed_and_extra() {
        let claims: Claims = serde_json::from_value(json!({
            "iss": "oak-auth",
            "iat": 1_700_000_000,
            "exp": 1_700_000_900,
            "type": "refresh",
            "user_id": "u-1",
            "role": "Admin",
            "scope": ["read"],
        }))
        .unwrap();

        assert!(claims.is_refresh());
        assert_eq!(claims.payload.user_id, Some(SubjectId::from("u-1")));
        assert_eq!(claims.role(), Some(Role::Admin));
        assert_eq!(claims.payload.extra.len(), 1);
        assert_eq!(claims.payload.extra.get("scope"), Some(&json!(["read"])));
    }

    #[test]
    fn unknown_token_kind_is_not_refresh() {
        let claims: Claims = serde_json::from_value(json!({
            "iss": "x", "iat": 1, "exp": 2, "type": "REFRESH",
        }))
        .unwrap();
        assert_eq!(claims.kind, None);
        assert!(!claims.is_refresh());

        let claims: Claims = serde_json::from_value(json!({
            "iss": "x", "iat": 1, "exp": 2, "type": 1,
        }))
        .unwrap();
        assert!(!claims.is_refresh());
    }

    #[test]
    fn mistyped_subject_fields_are_kept_raw() {
        let raw = json!({
            "iss": "x", "iat": 1, "exp": 2,
            "user_id": 4.5,
            "username": 5,
            "email": {"a": 1},
            "role": null,
            "scope": "read",
        });
        let claims: Claims = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(claims.payload.user_id, None);
        assert_eq!(claims.payload.username, None);
        assert_eq!(claims.payload.email, None);
        assert_eq!(claims.payload.mistyped("username"), Some(&json!(5)));
        assert_eq!(claims.payload.role, Some(RoleClaim::from(Value::Null)));
        assert_eq!(claims.role(), None);
        assert_eq!(claims.payload.extra.len(), 1);

        assert_eq!(serde_json::to_value(&claims).unwrap(), raw);
    }

    #[test]
    fn absent_role_differs_from_null_role() {
        let claims: Claims =
            serde_json::from_value(json!({"iss": "x", "iat": 1, "exp": 2})).unwrap();
        assert_eq!(claims.payload.role, None);
    }

    #[test]
    fn typed_builder_replaces_mistyped_value() {
        let payload: TokenPayload = serde_json::from_value(json!({"user_id": true})).unwrap();
        assert_eq!(payload.mistyped("user_id"), Some(&json!(true)));

        let payload = payload.with_user_id(3);
        assert_eq!(payload.mistyped("user_id"), None);
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"user_id": 3}));
    }

    #[test]
    fn numeric_date_keeps_millisecond_precision() {
        let date: NumericDate = serde_json::from_value(json!(1.005)).unwrap();
        assert_eq!(date.as_millis(), 1_005);
        assert_eq!(date.as_secs(), 1);
        assert_eq!(serde_json::to_value(date).unwrap(), json!(1.005));
        assert_eq!(
            NumericDate::from_millis(1_000).saturating_add(Duration::from_millis(1)),
            NumericDate::from_millis(1_001)
        );
    }

    #[test]
    fn subject_id_normalizes_numbers_and_strings() {
        let from_float: SubjectId = serde_json::from_value(json!(42.0)).unwrap();
        let from_text: SubjectId = serde_json::from_value(json!("42")).unwrap();

        assert_eq!(from_float, from_text);
        assert_eq!(from_float.as_i64(), Some(42));
        assert_eq!(from_text.as_i64(), Some(42));
        assert_eq!(from_float.as_str(), "42");
        assert_eq!(SubjectId::from("a7f3").as_i64(), None);
        assert!(serde_json::from_value::<SubjectId>(json!(4.5)).is_err());
        assert!(serde_json::from_value::<SubjectId>(json!(true)).is_err());
    }

    #[test]
    fn extra_claims_refuse_reserved_and_typed_names() {
        let mut extra = ExtraClaims::default();
        assert_eq!(
            extra.insert("exp", json!(0)),
            Err(ClaimError::Reserved("exp".to_string()))
        );
        assert_eq!(
            extra.insert("role", json!("admin")),
            Err(ClaimError::Reserved("role".to_string()))
        );
        assert!(extra.is_empty());
    }

    #[test]
    fn extra_claims_are_bounded() {
        let mut extra = ExtraClaims::default();
        for i in 0..MAX_EXTRA_CLAIMS {
            extra.insert(format!("k{i}"), json!(i)).unwrap();
        }
        assert_eq!(extra.insert("one-more", json!(0)), Err(ClaimError::TooMany));
        // Overwriting an existing entry does not grow the map.
        assert!(extra.insert("k0", json!("again")).is_ok());
    }

    #[test]
    fn strip_protected_removes_smuggled_names() {
        let mut extra: ExtraClaims =
            serde_json::from_value(json!({"iss": "evil", "username": "x", "keep": 1})).unwrap();
        let mut dropped = extra.strip_protected();
        dropped.sort();
        assert_eq!(dropped, vec!["iss".to_string(), "username".to_string()]);
        assert_eq!(extra.len(), 1);
    }
}
