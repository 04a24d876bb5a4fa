// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and role gating for the Oak Auth API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with a username (or email) and password
//! 2. Server checks the password against the sealed copy and issues an
//!    access token plus a refresh token
//! 3. Client sends `Authorization: Bearer <access token>`
//! 4. Server:
//!    - Verifies the HMAC signature and expiry
//!    - Refuses refresh tokens presented as access tokens
//!    - Extracts:
//!      - `user_id` → subject id
//!      - `role` → checked by role gates
//! 5. On expiry the client exchanges its refresh token for a new access token
//!
//! ## Security
//!
//! - Access and refresh tokens are signed with different secrets
//! - Only HMAC algorithms are accepted on verification
//! - Gate rejections never say why a token was refused
//! - No revocation: a token stays valid until it expires

pub mod claims;
pub mod clock;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod identity;
pub mod middleware;
pub mod roles;
pub mod token;

pub use claims::{Claims, ClaimError, ExtraClaims, NumericDate, SubjectId, TokenKind, TokenPayload};
pub use clock::{Clock, SystemClock};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use gate::{AuthGate, GateRejection, RoleGate};
pub use identity::AuthenticatedIdentity;
pub use middleware::{authenticate, require_role, RoleGuard};
pub use roles::{Role, RoleClaim, RoleMatch};
pub use token::{SignedToken, TokenService};
