//! Test utilities: a CAS client that validates from a fixed ticket table,
//! and a Router wired to in-memory stores the tests can inspect.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use cas_sso_session::app::build_router;
use cas_sso_session::config::{AppEnv, CasConfig, Config, SessionIndexBackend};
use cas_sso_session::services::cas::session_index::MemorySessionIndexStore;
use cas_sso_session::services::cas::{
    CasClient, CasError, CasPrincipal, HttpCasClient, LogoutPolicy, LogoutUrlParam,
    SessionCorrelator, TicketRelay,
};
use cas_sso_session::services::session::MemorySessionStore;
use cas_sso_session::state::AppState;
use url::Url;

pub const CAS_BASE: &str = "https://cas.example.com/cas";
pub const APP_HOST: &str = "app.example.com";
pub const SERVICE_URL: &str = "http://app.example.com/users/service";

/// URL templates come from the real client; validation answers from a table.
pub struct FakeCas {
    inner: HttpCasClient,
    tickets: Mutex<HashMap<String, String>>,
    validated: Mutex<Vec<(String, String)>>,
}

impl FakeCas {
    pub fn new(accepts_logout_service: bool) -> Self {
        let inner = HttpCasClient::new(
            Url::parse(CAS_BASE).unwrap(),
            accepts_logout_service,
            Duration::from_secs(1),
        )
        .unwrap();
        Self {
            inner,
            tickets: Mutex::new(HashMap::new()),
            validated: Mutex::new(Vec::new()),
        }
    }

    pub fn issue(&self, ticket: &str, user: &str) {
        self.tickets
            .lock()
            .unwrap()
            .insert(ticket.to_string(), user.to_string());
    }

    /// (ticket, service) pairs passed to validation, in call order.
    pub fn validated(&self) -> Vec<(String, String)> {
        self.validated.lock().unwrap().clone()
    }
}

#[async_trait]
impl CasClient for FakeCas {
    fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    fn login_url(&self, service: &str) -> Url {
        self.inner.login_url(service)
    }

    fn accepts_logout_service(&self) -> bool {
        self.inner.accepts_logout_service()
    }

    fn logout_url(
        &self,
        destination: Option<&str>,
        follow: Option<&str>,
        service: Option<&str>,
    ) -> Result<Url, CasError> {
        self.inner.logout_url(destination, follow, service)
    }

    async fn validate_service_ticket(
        &self,
        ticket: &str,
        service: &str,
    ) -> Result<CasPrincipal, CasError> {
        self.validated
            .lock()
            .unwrap()
            .push((ticket.to_string(), service.to_string()));

        // Service tickets are single-use.
        match self.tickets.lock().unwrap().remove(ticket) {
            Some(user) => Ok(CasPrincipal::new(user)),
            None => Err(CasError::Rejected {
                code: "INVALID_TICKET".into(),
                message: format!("Ticket {ticket} not recognized"),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        app_env: AppEnv::Development,
        cas: CasConfig {
            base_url: Url::parse(CAS_BASE).unwrap(),
            mount_path: "/users".into(),
            enable_single_sign_out: true,
            legacy_logout: false,
            logout: LogoutPolicy {
                param: LogoutUrlParam::None,
                destination_url: None,
                follow_url: None,
                after_sign_out_path: "/".into(),
            },
            after_sign_in_path: "/dashboard".into(),
            public_scheme: "http".into(),
            session_max_age_seconds: 3600,
            ticket_relay_ttl_seconds: 300,
            validate_timeout_seconds: 5,
        },
        session_index_backend: SessionIndexBackend::Memory,
        valkey_url: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub cas: Arc<FakeCas>,
    pub sessions: Arc<MemorySessionStore>,
    pub session_index: Arc<MemorySessionIndexStore>,
}

pub fn build_test_app() -> TestApp {
    build_test_app_with_config(test_config())
}

pub fn build_test_app_with_config(config: Config) -> TestApp {
    let cas = Arc::new(FakeCas::new(!config.cas.legacy_logout));
    let sessions = Arc::new(MemorySessionStore::with_max_age(chrono::Duration::seconds(
        config.cas.session_max_age_seconds as i64,
    )));
    let session_index = Arc::new(MemorySessionIndexStore::new());

    let correlator = Arc::new(SessionCorrelator::new(
        config.cas.enable_single_sign_out,
        session_index.clone(),
        sessions.clone(),
    ));
    let ticket_relay = Arc::new(TicketRelay::new(Duration::from_secs(
        config.cas.ticket_relay_ttl_seconds,
    )));

    let state = AppState::new(
        Arc::new(config.cas.clone()),
        cas.clone(),
        sessions.clone(),
        correlator,
        ticket_relay,
    );

    TestApp {
        router: build_router(state, &config),
        cas,
        sessions,
        session_index,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, APP_HOST)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, APP_HOST)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Form-encoded CAS logout push.
pub fn logout_push(uri: &str, logout_request: &str) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("logoutRequest", logout_request)
        .finish();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, APP_HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn logout_request_xml(session_index: &str) -> String {
    format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="LR-1" Version="2.0" IssueInstant="2026-10-17T09:00:00Z"><saml:NameID xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">@NOT_USED@</saml:NameID><samlp:SessionIndex>{session_index}</samlp:SessionIndex></samlp:LogoutRequest>"#
    )
}

pub fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Value of `name` from the response's Set-Cookie headers.
pub fn set_cookie<B>(response: &Response<B>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}
