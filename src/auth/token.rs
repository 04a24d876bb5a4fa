// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Service
//!
//! Issues, validates and refreshes HMAC-signed bearer tokens.
//!
//! ## Key domains
//!
//! Access and refresh tokens are signed with different secrets. A refresh
//! token is rejected by [`TokenService::validate_token`] twice over: its
//! signature does not verify under the access key, and its `type` claim marks
//! it as a refresh token.
//!
//! ## Algorithms
//!
//! Tokens are issued as HS256. Verification accepts the HMAC family only
//! (HS256/HS384/HS512); asymmetric algorithms and `none` are refused before
//! any key is touched.
//!
//! ## Lifecycle
//!
//! `issued -> valid -> expired`. There is no revocation: a token stays valid
//! until `exp`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, warn};

use super::claims::{Claims, NumericDate, TokenKind, TokenPayload, MAX_EXTRA_CLAIMS};
use super::clock::{Clock, SystemClock};
use super::error::AuthError;
use crate::config::{ConfigError, TokenSettings, JWT_SECRET_KEY_ENV, MIN_SECRET_LEN};

/// Algorithm used for every issued token.
pub const ISSUE_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted on verification.
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Suffix appended to the access secret when no refresh secret is configured.
const DERIVED_REFRESH_SUFFIX: &str = "-refresh";

/// A compact JWS together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    compact: String,
    expires_at: NumericDate,
}

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.compact
    }

    pub fn expires_at(&self) -> NumericDate {
        self.expires_at
    }

    pub fn into_string(self) -> String {
        self.compact
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compact)
    }
}

/// Signing and verification keys for one token kind.
struct KeyDomain {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyDomain {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues and verifies access and refresh tokens.
///
/// Immutable after construction and safe to share behind an `Arc`.
pub struct TokenService {
    access: KeyDomain,
    refresh: KeyDomain,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    leeway: Duration,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from startup settings.
    ///
    /// Refuses an empty secret and a refresh secret equal to the access
    /// secret. A missing refresh secret is derived from the access secret
    /// and logged as insecure.
    pub fn new(settings: &TokenSettings) -> Result<Self, ConfigError> {
        if settings.secret.is_empty() {
            return Err(ConfigError::MissingSecret(JWT_SECRET_KEY_ENV));
        }
        if settings.secret.len() < MIN_SECRET_LEN {
            warn!(
                min_len = MIN_SECRET_LEN,
                "Access token secret is shorter than recommended"
            );
        }

        let refresh_secret = match settings.refresh_secret.as_deref() {
            Some(secret) => secret.to_string(),
            None => {
                warn!(
                    "No refresh token secret configured; deriving one from the access secret. \
                     This is insecure, set an independent refresh secret"
                );
                format!("{}{DERIVED_REFRESH_SUFFIX}", settings.secret)
            }
        };
        if refresh_secret == settings.secret {
            return Err(ConfigError::SharedRefreshSecret);
        }

        let mut validation = Validation::new(ISSUE_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Expiry is checked here at millisecond precision, not by the library.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            access: KeyDomain::from_secret(settings.secret.as_bytes()),
            refresh: KeyDomain::from_secret(refresh_secret.as_bytes()),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
            issuer: settings.issuer.clone(),
            leeway: Duration::ZERO,
            clock: Arc::new(SystemClock),
            validation,
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tolerate clocks that disagree by up to `leeway` when checking expiry.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    // =========================================================================
    // Issuance
    // =========================================================================

    /// Issue an access token. `None` (or a zero TTL) uses the default lifetime.
    pub fn create_token(
        &self,
        payload: TokenPayload,
        ttl: Option<Duration>,
    ) -> Result<String, AuthError> {
        self.issue_access(payload, ttl).map(SignedToken::into_string)
    }

    /// Issue a refresh token with the refresh lifetime.
    pub fn create_refresh_token(&self, payload: TokenPayload) -> Result<String, AuthError> {
        self.issue_refresh(payload).map(SignedToken::into_string)
    }

    /// Like [`create_token`](Self::create_token), keeping the expiry alongside.
    pub fn issue_access(
        &self,
        payload: TokenPayload,
        ttl: Option<Duration>,
    ) -> Result<SignedToken, AuthError> {
        let ttl = ttl.filter(|ttl| !ttl.is_zero()).unwrap_or(self.access_ttl);
        self.sign(&self.access, payload, ttl, None)
    }

    /// Like [`create_refresh_token`](Self::create_refresh_token), keeping the
    /// expiry alongside.
    pub fn issue_refresh(&self, payload: TokenPayload) -> Result<SignedToken, AuthError> {
        self.sign(&self.refresh, payload, self.refresh_ttl, Some(TokenKind::Refresh))
    }

    fn sign(
        &self,
        domain: &KeyDomain,
        mut payload: TokenPayload,
        ttl: Duration,
        kind: Option<TokenKind>,
    ) -> Result<SignedToken, AuthError> {
        let dropped = payload.extra.strip_protected();
        if !dropped.is_empty() {
            warn!(claims = ?dropped, "Dropped caller claims that shadow issuer claims");
        }
        if payload.extra.len() > MAX_EXTRA_CLAIMS {
            warn!(
                count = payload.extra.len(),
                max = MAX_EXTRA_CLAIMS,
                "Refusing to sign oversized claim set"
            );
            return Err(AuthError::InvalidToken);
        }

        let issued_at = NumericDate::from_millis(self.clock.now_millis());
        let claims = Claims {
            issuer: self.issuer.clone(),
            issued_at,
            expires_at: issued_at.saturating_add(ttl),
            kind,
            payload,
        };

        let compact = encode(&Header::new(ISSUE_ALGORITHM), &claims, &domain.encoding)
            .map_err(|e| {
                warn!(error = %e, "Token signing failed");
                AuthError::InvalidToken
            })?;

        Ok(SignedToken {
            compact,
            expires_at: claims.expires_at,
        })
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verify an access token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.verify(&self.access, token)?;
        match claims.kind {
            Some(TokenKind::Refresh) => {
                debug!("Refresh token presented as access token");
                Err(AuthError::InvalidToken)
            }
            Some(TokenKind::Access) | None => Ok(claims),
        }
    }

    /// Pull the token out of an `Authorization` header value.
    ///
    /// The value must be exactly `<scheme> <token>` separated by a single
    /// space, with the scheme equal to `Bearer` ignoring ASCII case.
    pub fn extract_token_from_header(header: Option<&str>) -> Result<&str, AuthError> {
        let header = match header {
            Some(h) if !h.is_empty() => h,
            _ => return Err(AuthError::MissingToken),
        };

        let mut parts = header.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None)
                if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() =>
            {
                Ok(token)
            }
            _ => Err(AuthError::InvalidAuthHeader),
        }
    }

    /// Extract then validate; the first failure wins.
    pub fn validate_token_from_header(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let token = Self::extract_token_from_header(header)?;
        self.validate_token(token)
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The new token carries every non-reserved claim of the refresh token
    /// unchanged, with new `iss`, `iat` and `exp` and the default lifetime.
    /// The refresh token itself is left as is.
    pub fn refresh_token(&self, refresh: &str) -> Result<String, AuthError> {
        self.refresh_signed(refresh).map(SignedToken::into_string)
    }

    /// Like [`refresh_token`](Self::refresh_token), keeping the expiry alongside.
    pub fn refresh_signed(&self, refresh: &str) -> Result<SignedToken, AuthError> {
        let claims = match self.verify(&self.refresh, refresh) {
            Ok(claims) => claims,
            // An access token does not verify under the refresh key; name it
            // for what it is rather than calling it forged.
            Err(AuthError::InvalidToken) if self.verify(&self.access, refresh).is_ok() => {
                debug!("Access token presented for refresh");
                return Err(AuthError::NotARefreshToken);
            }
            Err(e) => return Err(e),
        };

        match claims.kind {
            Some(TokenKind::Refresh) => self.issue_access(claims.into_payload(), None),
            Some(TokenKind::Access) | None => Err(AuthError::NotARefreshToken),
        }
    }

    /// Signature, structure, claim-set bound and expiry under one key domain.
    fn verify(&self, domain: &KeyDomain, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &domain.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            AuthError::InvalidToken
        })?;
        let claims = data.claims;

        if claims.payload.extra.len() > MAX_EXTRA_CLAIMS {
            debug!(count = claims.payload.extra.len(), "Token carries too many claims");
            return Err(AuthError::InvalidToken);
        }

        let now = self.clock.now_millis();
        let deadline = claims.expires_at.saturating_add(self.leeway);
        if now > deadline.as_millis() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}
