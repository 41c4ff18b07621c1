//! Small URL helpers around the sign-in redirect.

/// Scheme + host of the current request, e.g. `https://app.example.com`.
///
/// The port is kept only when it is not the scheme's default.
pub fn request_base_url(scheme: &str, host: &str) -> String {
    let host = match (scheme, host.rsplit_once(':')) {
        ("http", Some((name, "80"))) | ("https", Some((name, "443"))) => name,
        _ => host,
    };
    format!("{scheme}://{host}")
}

/// The ticket-return endpoint CAS redirects back to.
pub fn service_url(request_base_url: &str, service_path: &str) -> String {
    format!("{request_base_url}{service_path}")
}

/// Whether the browser is coming back from CAS rather than starting a sign-in.
///
/// True when a ticket is present, or the referer is the CAS server, or the
/// referer is our own ticket-return endpoint (browser back button after a
/// completed sign-in, double submits).
pub fn returning_from_cas(
    ticket: Option<&str>,
    referer: Option<&str>,
    cas_base_url: &str,
    service_url: &str,
) -> bool {
    if ticket.is_some_and(|t| !t.is_empty()) {
        return true;
    }

    referer.is_some_and(|r| r.starts_with(cas_base_url) || r.starts_with(service_url))
}
