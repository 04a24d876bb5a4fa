// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user directory.
//!
//! Holds the accounts the login endpoint checks credentials against.
//! Passwords are kept only in sealed form (see [`crate::crypto`]); the
//! directory itself never sees a plaintext password after registration.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::Role;
use crate::crypto::CredentialCipher;
use crate::error::ApiError;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Sealed password, as produced by [`CredentialCipher::encrypt`].
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: HashMap<Uuid, StoredUser>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal `password` and add the account.
    ///
    /// Usernames and emails are unique; emails compare case-insensitively.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        role: Role,
        password: &str,
        cipher: &CredentialCipher,
    ) -> Result<StoredUser, ApiError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request(
                "username, email and password are required",
            ));
        }
        if self.find_by_login(username).is_some() || self.find_by_login(email).is_some() {
            return Err(ApiError::conflict("User already exists"));
        }

        let user = StoredUser {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            password: cipher.encrypt(password.as_bytes())?,
            created_at: Utc::now(),
        };
        self.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    /// Look an account up by username or email.
    pub fn find_by_login(&self, login: &str) -> Option<&StoredUser> {
        self.users
            .values()
            .find(|user| user.username == login || user.email.eq_ignore_ascii_case(login))
    }

    pub fn get(&self, user_id: &Uuid) -> Option<&StoredUser> {
        self.users.get(user_id)
    }

    /// Number of accounts per role.
    pub fn count_by_role(&self, role: Role) -> usize {
        self.users.values().filter(|user| user.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
