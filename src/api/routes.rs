/*
 * Responsibility
 * - URL layout of the CAS endpoints (mounted under CAS_MOUNT_PATH)
 * - The service URL answers GET (ticket return) and POST (CAS logout push)
 */
use axum::{Router, routing::get};

use crate::api::handlers::{
    sessions::{service, sign_in, sign_out, unregistered},
    single_sign_out::single_sign_out,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign_in", get(sign_in))
        .route("/service", get(service).post(single_sign_out))
        .route("/single_sign_out", get(single_sign_out).post(single_sign_out))
        .route("/sign_out", get(sign_out).delete(sign_out))
        .route("/unregistered", get(unregistered))
}
