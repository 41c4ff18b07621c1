/*
 * Responsibility
 * - sign_in: redirect to CAS login unless the browser is coming back from CAS
 * - service: ticket return → validate → local session → session index registration
 * - sign_out: local sign-out → redirect to CAS logout
 * - unregistered: landing page for principals without a local account
 */
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::{
    api::cookies::{self, ATTEMPT_COOKIE, SESSION_COOKIE},
    error::AppError,
    services::{
        cas::{AttemptId, SessionIndex, logout_url, urls},
        session::LocalSessionId,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub ticket: Option<String>,
}

// `scheme://host` of this request; X-Forwarded-Proto wins over the configured scheme.
fn request_url(state: &AppState, headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| state.cas.public_scheme.clone());
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    urls::request_base_url(&scheme, host)
}

fn service_url(state: &AppState, request_url: &str) -> String {
    urls::service_url(request_url, &state.cas.service_path())
}

fn secure_cookies(request_url: &str) -> bool {
    request_url.starts_with("https://")
}

pub async fn sign_in(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
    headers: HeaderMap,
) -> Response {
    let request_url = request_url(&state, &headers);
    let service = service_url(&state, &request_url);
    let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok());

    if urls::returning_from_cas(
        query.ticket.as_deref(),
        referer,
        state.cas.cas_base_str(),
        &service,
    ) {
        return (StatusCode::OK, Json(json!({"status": "returning_from_cas"}))).into_response();
    }

    // New sign-in attempt: every ticket delivered for it lands in its own relay slot.
    let attempt = AttemptId::generate();
    let login_url = state.cas_client.login_url(&service);
    debug!(attempt = attempt.as_str(), %login_url, "redirecting to CAS login");

    (
        AppendHeaders([(
            header::SET_COOKIE,
            cookies::set(
                ATTEMPT_COOKIE,
                attempt.as_str(),
                secure_cookies(&request_url),
                Some(state.cas.ticket_relay_ttl_seconds),
            ),
        )]),
        Redirect::to(login_url.as_str()),
    )
        .into_response()
}

pub async fn service(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // Without an attempt cookie the ticket gets a private slot of its own.
    let attempt = cookies::get(&headers, ATTEMPT_COOKIE)
        .map(AttemptId::new)
        .unwrap_or_else(AttemptId::generate);

    if let Some(ticket) = query.ticket.as_deref().filter(|t| !t.is_empty()) {
        state.ticket_relay.set(&attempt, ticket);
    }

    // CAS may deliver a proxy ticket before the service ticket; the last one wins.
    let ticket = state
        .ticket_relay
        .take(&attempt)
        .ok_or_else(|| AppError::bad_request("MISSING_TICKET", "ticket is required"))?;

    let request_url = request_url(&state, &headers);
    let service = service_url(&state, &request_url);

    let principal = state
        .cas_client
        .validate_service_ticket(&ticket, &service)
        .await
        .map_err(|err| {
            warn!(error = %err, "service ticket validation failed");
            AppError::from(err)
        })?;

    let user = principal.user.clone();
    let session_id = state
        .sessions
        .create(principal, &ticket)
        .await
        .map_err(|err| {
            error!(
                error = %err,
                backend = state.sessions.backend_name(),
                "failed to create local session"
            );
            AppError::from(err)
        })?;

    if let Err(err) = state
        .correlator
        .register(&SessionIndex::new(ticket.as_str()), &session_id)
        .await
    {
        // A session nobody can log out remotely is worse than a failed sign-in.
        error!(error = %err, %session_id, "failed to register CAS session index");
        if let Err(err) = state.sessions.destroy_by_id(&session_id).await {
            error!(error = %err, %session_id, "failed to discard unregistered session");
        }
        return Err(err.into());
    }

    info!(%user, %session_id, "signed in via CAS");

    let secure = secure_cookies(&request_url);
    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                cookies::set(
                    SESSION_COOKIE,
                    session_id.as_str(),
                    secure,
                    Some(state.cas.session_max_age_seconds),
                ),
            ),
            (header::SET_COOKIE, cookies::clear(ATTEMPT_COOKIE, secure)),
        ]),
        Redirect::to(&state.cas.after_sign_in_path),
    )
        .into_response())
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    // Taken even when expired, so its session index record goes too.
    let session = match cookies::get(&headers, SESSION_COOKIE) {
        Some(id) => state
            .sessions
            .take(&LocalSessionId::new(id))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to remove local session on sign-out");
                None
            }),
        None => None,
    };

    // Not signed in locally can still mean an open CAS session; just reset cookies.
    if let Some(session) = session {
        state
            .correlator
            .unregister(&SessionIndex::new(session.service_ticket.as_str()))
            .await;
        info!(user = %session.principal.user, session_id = %session.id, "signed out");
    } else {
        debug!("sign-out without a local session");
    }

    let request_url = request_url(&state, &headers);
    let logout_url = logout_url::build(
        &state.cas.logout,
        &request_url,
        |base| service_url(&state, base),
        state.cas_client.as_ref(),
    )?;

    let secure = secure_cookies(&request_url);
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, cookies::clear(SESSION_COOKIE, secure)),
            (header::SET_COOKIE, cookies::clear(ATTEMPT_COOKIE, secure)),
        ]),
        Redirect::to(logout_url.as_str()),
    )
        .into_response())
}

pub async fn unregistered() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "unregistered",
            "message": "signed in to CAS, but no local account is registered for this user"
        })),
    )
}
