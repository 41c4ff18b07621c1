/*
 * Responsibility
 * - Router-level layers shared by every endpoint
 * - http: request id, body limit, timeout, access log
 * - security_headers: browser-facing response headers
 */
pub mod http;
pub mod security_headers;
