/*
 * Responsibility
 * - HTTP surface of the CAS binding (routes() re-export, handlers, cookies)
 */
pub mod cookies;
pub mod handlers;
mod routes;

pub use routes::routes;
