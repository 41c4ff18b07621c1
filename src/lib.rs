/*
 * Responsibility
 * - Crate root: CAS single sign-on / single sign-out for an axum service
 * - Modules are public so integration tests can assemble the Router
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
