//! Transport-level layers for every route.
//!
//! Responsibility:
//! - X-Request-Id: generated when absent, echoed on the response
//! - Access log (TraceLayer)
//! - Hard body limit (the logout push handler applies its own, smaller one)
//! - Global timeout that outlasts the CAS ticket validation call

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::HeaderName;
use axum::response::{IntoResponse, Response};
use tower::{BoxError, ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::error::AppError;

const REQUEST_ID: &str = "x-request-id";

// No route takes anything near this; larger bodies get 413 before routing.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

const TIMEOUT_HEADROOM: Duration = Duration::from_secs(5);

/// Wrap `router`; `upstream_timeout` is the CAS validation timeout.
pub fn apply(router: Router, upstream_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(layer_error))
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
            .layer(TimeoutLayer::new(upstream_timeout + TIMEOUT_HEADROOM))
            .layer(TraceLayer::new_for_http()),
    )
}

// Same JSON error shape as the handlers.
async fn layer_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        AppError::Timeout.into_response()
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        AppError::Internal.into_response()
    }
}
