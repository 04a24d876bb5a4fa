// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Oak Auth - Bearer Token & Credential Security Service
//!
//! This crate issues and verifies HMAC-signed bearer tokens, seals stored
//! credentials with AES-256-GCM, and gates Axum handlers on authentication
//! and roles.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token service, request gates, extractors and middleware
//! - `config` - Environment configuration
//! - `crypto` - Credential encryption at rest
//! - `store` - In-memory user directory

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
