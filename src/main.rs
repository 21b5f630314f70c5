// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coursify_server::{
    api::{cors_layer, router},
    auth::{IdentityGate, TokenService},
    config::{ServerConfig, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    state::AppState,
    storage::CourseDatabase,
};

/// Time allowed for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.pretty().init(),
    }
}

/// Resolve on Ctrl-C or SIGTERM, then cancel `shutdown`.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = ServerConfig::from_env()?;

    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.database_path();
    let db = CourseDatabase::open(&db_path)?;
    info!(path = %db_path.display(), "Record store opened");

    let tokens = TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    if let Some(seed) = &config.seed_admin {
        IdentityGate::new(&db, &tokens)
            .ensure_admin(&seed.email, seed.password.clone())
            .await?;
    }

    let state = AppState::new(db, tokens, config.login_rate_limit);
    let app = router(state, cors_layer(&config.cors_allowed_origins))
        .into_make_service_with_connect_info::<SocketAddr>();

    let shutdown = CancellationToken::new();
    let handle = Handle::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));
    {
        let handle = handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!(%addr, "Coursify listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app)
                .await?;
        }
        None => {
            info!(%addr, "Coursify listening on http (docs at /docs)");
            axum_server::bind(addr).handle(handle).serve(app).await?;
        }
    }

    info!("Server stopped");
    Ok(())
}
