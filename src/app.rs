/*
 * Responsibility
 * - Read Config → build services (session index store, CAS client, local sessions, correlator, relay)
 * - Assemble the Router and apply middleware
 * - axum::serve() start-up
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, handlers::health::health};
use crate::config::{Config, SessionIndexBackend};
use crate::middleware;
use crate::services::cache::ValkeyClient;
use crate::services::cas::session_index::{
    self, MemorySessionIndexStore, SessionIndexStore, ValkeySessionIndexStore,
};
use crate::services::cas::{HttpCasClient, SessionCorrelator, TicketRelay};
use crate::services::session::{
    self, MemorySessionStore, SessionStore, ValkeySessionStore,
};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cas_sso_session=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing; stderr may be hidden.
        tracing::error!(?info, "panic");

        // Development fails fast, production keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting CAS session service in {:?} mode on {} (CAS at {}, single sign-out {})",
        config.app_env,
        config.addr,
        config.cas.base_url,
        if config.cas.enable_single_sign_out { "on" } else { "off" },
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let session_max_age = Duration::from_secs(config.cas.session_max_age_seconds);

    // Index records and local sessions always live in the same place: a logout
    // push resolved on one instance must be able to destroy a session created
    // on another.
    let (session_index, sessions): (Arc<dyn SessionIndexStore>, Arc<dyn SessionStore>) =
        match config.session_index_backend {
            SessionIndexBackend::Memory => {
                if config.cas.enable_single_sign_out {
                    tracing::warn!(
                        "sessions are process-local; single sign-out only reaches sessions created by this instance"
                    );
                }
                let max_age = chrono::Duration::try_seconds(
                    i64::try_from(config.cas.session_max_age_seconds).unwrap_or(i64::MAX),
                )
                .unwrap_or_else(|| chrono::Duration::days(1));
                (
                    Arc::new(MemorySessionIndexStore::with_ttl(session_max_age)),
                    Arc::new(MemorySessionStore::with_max_age(max_age)),
                )
            }
            SessionIndexBackend::Valkey => {
                let url = config
                    .valkey_url
                    .as_deref()
                    .context("VALKEY_URL is required for the valkey backend")?;
                let cache = Arc::new(
                    ValkeyClient::new(url)
                        .await
                        .context("failed to connect to valkey")?,
                );
                (
                    Arc::new(ValkeySessionIndexStore::new(
                        cache.clone(),
                        session_index::valkey::DEFAULT_PREFIX,
                        session_max_age,
                    )),
                    Arc::new(ValkeySessionStore::new(
                        cache,
                        session::valkey::DEFAULT_PREFIX,
                        session_max_age,
                    )),
                )
            }
        };
    tracing::info!(
        index_backend = session_index.backend_name(),
        session_backend = sessions.backend_name(),
        "session stores ready"
    );

    let cas_client = Arc::new(
        HttpCasClient::new(
            config.cas.base_url.clone(),
            !config.cas.legacy_logout,
            Duration::from_secs(config.cas.validate_timeout_seconds),
        )
        .context("failed to build CAS HTTP client")?,
    );

    let correlator = Arc::new(SessionCorrelator::new(
        config.cas.enable_single_sign_out,
        session_index,
        sessions.clone(),
    ));

    let ticket_relay = Arc::new(TicketRelay::new(Duration::from_secs(
        config.cas.ticket_relay_ttl_seconds,
    )));

    Ok(AppState::new(
        Arc::new(config.cas.clone()),
        cas_client,
        sessions,
        correlator,
        ticket_relay,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let mount_path = config.cas.mount_path.as_str();

    let router = Router::new().route("/health", get(health));
    let router = if mount_path.is_empty() {
        router.merge(api::routes())
    } else {
        router.nest(mount_path, api::routes())
    };
    let router = router.with_state(state);

    let router = middleware::security_headers::apply(router);
    middleware::http::apply(
        router,
        Duration::from_secs(config.cas.validate_timeout_seconds),
    )
}
