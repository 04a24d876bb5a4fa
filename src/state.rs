// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::RwLock;

use crate::auth::{AuthGate, TokenService};
use crate::crypto::CredentialCipher;
use crate::store::InMemoryUserStore;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub cipher: Arc<CredentialCipher>,
    pub users: Arc<RwLock<InMemoryUserStore>>,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(tokens: TokenService, cipher: CredentialCipher, users: InMemoryUserStore) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            gate: AuthGate::new(tokens.clone()),
            tokens,
            cipher: Arc::new(cipher),
            users: Arc::new(RwLock::new(users)),
        }
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}
