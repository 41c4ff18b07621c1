/*
 * Responsibility
 * - Receive CAS single-sign-out pushes (POST to the service URL or /single_sign_out)
 * - Pull `logoutRequest` out of the form body and hand it to the correlator
 * - Always answer 200 with an empty body; the CAS server does not act on the status
 */
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode, header},
};
use tracing::debug;

use crate::{services::cas::slo_parser, state::AppState};

const LOGOUT_REQUEST_PARAM: &str = "logoutRequest";

/// Form bodies above this are acknowledged without being parsed.
/// `logoutRequest=` form encoding can triple an XML payload.
pub const MAX_FORM_BYTES: usize = slo_parser::MAX_NOTIFICATION_BYTES * 3;

pub async fn single_sign_out(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    // Multipart bodies are never read.
    let logout_request = if slo_parser::is_multipart(content_type) {
        String::new()
    } else {
        match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
            Ok(bytes) => url::form_urlencoded::parse(&bytes)
                .find(|(key, _)| key == LOGOUT_REQUEST_PARAM)
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default(),
            Err(err) => {
                debug!(error = %err, "logout notification body unreadable or too large");
                String::new()
            }
        }
    };

    let outcome = state
        .correlator
        .handle_notification(content_type, method == Method::POST, &logout_request)
        .await;
    debug!(?outcome, "single-sign-out request processed");

    StatusCode::OK
}
