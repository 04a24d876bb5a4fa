// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; a missing secret aborts startup before the listener binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET_KEY` | HMAC secret for access tokens | Required |
//! | `JWT_REFRESH_SECRET_KEY` | HMAC secret for refresh tokens | `JWT_SECRET_KEY` + `-refresh` (insecure, warns) |
//! | `JWT_DEFAULT_EXPIRATION` | Access token lifetime | `15m` |
//! | `JWT_REFRESH_EXPIRATION` | Refresh token lifetime | `7d` |
//! | `JWT_ISSUER` | `iss` claim on issued tokens | `oak-auth` |
//! | `CREDENTIAL_KEY` | Base64 AES-256 key for stored credentials | Required |
//! | `SEED_USER` | `username:email:role:password` user to seed | None |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Durations take a humantime expression (`15m`, `1h 30m`, `7days`), a bare
//! number of seconds, or a number of days suffixed with `d`.

use std::fmt;
use std::time::Duration;

use crate::auth::Role;

/// Environment variable name for the access-token signing secret.
pub const JWT_SECRET_KEY_ENV: &str = "JWT_SECRET_KEY";

/// Environment variable name for the refresh-token signing secret.
pub const JWT_REFRESH_SECRET_KEY_ENV: &str = "JWT_REFRESH_SECRET_KEY";

/// Environment variable name for the access-token lifetime.
pub const JWT_DEFAULT_EXPIRATION_ENV: &str = "JWT_DEFAULT_EXPIRATION";

/// Environment variable name for the refresh-token lifetime.
pub const JWT_REFRESH_EXPIRATION_ENV: &str = "JWT_REFRESH_EXPIRATION";

/// Environment variable name for the token issuer.
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";

/// Environment variable name for the credential encryption key.
///
/// Standard padded Base64 of exactly 32 random bytes, e.g. the output of
/// `openssl rand -base64 32`.
pub const CREDENTIAL_KEY_ENV: &str = "CREDENTIAL_KEY";

/// Environment variable name for the optional seed user.
pub const SEED_USER_ENV: &str = "SEED_USER";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the logging format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default access-token lifetime.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh-token lifetime.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default issuer.
pub const DEFAULT_ISSUER: &str = env!("CARGO_PKG_NAME");

/// Secrets shorter than this trigger a startup warning.
pub const MIN_SECRET_LEN: usize = 32;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Startup configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set to a non-empty value")]
    MissingSecret(&'static str),
    #[error("{var} must be Base64 of exactly 32 bytes", var = CREDENTIAL_KEY_ENV)]
    InvalidCredentialKey,
    #[error("{refresh} must differ from {access}", refresh = JWT_REFRESH_SECRET_KEY_ENV, access = JWT_SECRET_KEY_ENV)]
    SharedRefreshSecret,
    #[error("{name} is not a valid duration: {value:?}")]
    InvalidDuration { name: &'static str, value: String },
    #[error("{var} must look like username:email:role:password", var = SEED_USER_ENV)]
    InvalidSeedUser,
}

// =============================================================================
// Token settings
// =============================================================================

/// Everything the token service needs, read once at startup.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    /// `None` falls back to a key derived from `secret`.
    pub refresh_secret: Option<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field(
                "refresh_secret",
                &self.refresh_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenSettings {
    /// Settings with default lifetimes and issuer.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            refresh_secret: None,
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    pub fn with_refresh_secret(mut self, secret: impl Into<String>) -> Self {
        self.refresh_secret = Some(secret.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = non_empty(lookup(JWT_SECRET_KEY_ENV))
            .ok_or(ConfigError::MissingSecret(JWT_SECRET_KEY_ENV))?;

        let access_ttl = duration_or_default(
            JWT_DEFAULT_EXPIRATION_ENV,
            lookup(JWT_DEFAULT_EXPIRATION_ENV),
            DEFAULT_ACCESS_TTL,
        )?;
        let refresh_ttl = duration_or_default(
            JWT_REFRESH_EXPIRATION_ENV,
            lookup(JWT_REFRESH_EXPIRATION_ENV),
            DEFAULT_REFRESH_TTL,
        )?;

        Ok(Self {
            secret,
            refresh_secret: non_empty(lookup(JWT_REFRESH_SECRET_KEY_ENV)),
            access_ttl,
            refresh_ttl,
            issuer: non_empty(lookup(JWT_ISSUER_ENV))
                .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse `raw` as a lifetime, falling back to `default` when it is unset or
/// unreadable. An explicit zero is refused.
fn duration_or_default(
    name: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(default);
    };
    match parse_duration(&raw) {
        Some(d) if d.is_zero() => Err(ConfigError::InvalidDuration { name, value: raw }),
        Some(d) => Ok(d),
        None => {
            tracing::warn!(
                variable = name,
                value = %raw,
                default = %humantime::format_duration(default),
                "Unparseable duration, using default"
            );
            Ok(default)
        }
    }
}

/// Parse a lifetime: `900`, `15m`, `1h 30m`, `7d`, `7days`.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Some(days) = raw.strip_suffix('d').and_then(|d| d.trim().parse::<u64>().ok()) {
        return days.checked_mul(24 * 60 * 60).map(Duration::from_secs);
    }
    humantime::parse_duration(raw).ok()
}

// =============================================================================
// Seed user
// =============================================================================

/// User created at startup from `SEED_USER`.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl SeedUser {
    /// Parse `username:email:role:password`. The password may itself
    /// contain colons.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut parts = raw.splitn(4, ':');
        let (Some(username), Some(email), Some(role), Some(password)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ConfigError::InvalidSeedUser);
        };
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ConfigError::InvalidSeedUser);
        }
        let role = Role::parse(role, Default::default()).ok_or(ConfigError::InvalidSeedUser)?;
        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            role,
            password: password.to_string(),
        })
    }

    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        non_empty(std::env::var(SEED_USER_ENV).ok())
            .map(|raw| Self::parse(&raw))
            .transpose()
    }
}
