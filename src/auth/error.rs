// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures of token handling and credential decryption.
///
/// The set is closed: callers match on it exhaustively, and nothing outside
/// these six outcomes is ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingToken,
    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Malformed token, bad signature, disallowed algorithm or wrong key domain
    #[error("Token is invalid")]
    InvalidToken,
    /// Signature verified but the token is past its expiry
    #[error("Token has expired")]
    ExpiredToken,
    /// A refresh was attempted with a token that is not a refresh token
    #[error("Token is not a refresh token")]
    NotARefreshToken,
    /// Stored credential could not be decoded or authenticated
    #[error("Credential ciphertext is invalid")]
    InvalidCiphertext,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::NotARefreshToken => "not_a_refresh_token",
            AuthError::InvalidCiphertext => "invalid_ciphertext",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::NotARefreshToken => StatusCode::UNAUTHORIZED,
            // A stored credential that fails to open is our fault, not the caller's.
            AuthError::InvalidCiphertext => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
