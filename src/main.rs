// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, process::ExitCode};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oak_auth::{
    api::router,
    auth::TokenService,
    config::{
        ConfigError, SeedUser, TokenSettings, CREDENTIAL_KEY_ENV, DEFAULT_HOST, DEFAULT_PORT,
        HOST_ENV, LOG_FORMAT_ENV, PORT_ENV,
    },
    crypto::CredentialCipher,
    state::AppState,
    store::InMemoryUserStore,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn load_state() -> Result<AppState, ConfigError> {
    let tokens = TokenService::new(&TokenSettings::from_env()?)?;

    let key = env::var(CREDENTIAL_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingSecret(CREDENTIAL_KEY_ENV))?;
    let cipher =
        CredentialCipher::from_base64(&key).map_err(|_| ConfigError::InvalidCredentialKey)?;

    let mut users = InMemoryUserStore::new();
    if let Some(seed) = SeedUser::from_env()? {
        match users.register(&seed.username, &seed.email, seed.role, &seed.password, &cipher) {
            Ok(user) => info!(user_id = %user.user_id, role = %user.role, "Seeded user"),
            Err(e) => warn!(error = %e.message, "Failed to seed user"),
        }
    }

    Ok(AppState::new(tokens, cipher, users))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let state = match load_state() {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let app = router(state);

    // Parse bind address
    let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = env::var(PORT_ENV)
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, %host, port, "Failed to parse bind address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
            }
        }
    });

    info!(%addr, "Oak Auth listening (docs at /docs)");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    match result {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
