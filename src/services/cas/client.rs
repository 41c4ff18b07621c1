//! CAS protocol client: login/logout URL templates and service ticket validation.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::services::cas::validation::parse_service_response;

/// Authenticated identity returned by a successful ticket validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasPrincipal {
    pub user: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl CasPrincipal {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            attributes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CasError {
    #[error("ticket rejected by CAS: {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("invalid CAS validation response: {0}")]
    InvalidResponse(String),

    #[error("CAS transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CAS client does not accept a service parameter on logout")]
    ServiceNotAccepted,
}

/// What the session layer needs from a CAS client.
///
/// `accepts_logout_service` is an explicit capability flag: older CAS clients
/// build logout URLs from `destination`/`follow` only, and callers must check
/// the flag instead of passing a service and hoping for the best.
#[async_trait]
pub trait CasClient: Send + Sync {
    fn base_url(&self) -> &Url;

    fn login_url(&self, service: &str) -> Url;

    fn accepts_logout_service(&self) -> bool;

    // Returns `CasError::ServiceNotAccepted` when `service` is given to a client
    // whose `accepts_logout_service()` is false.
    fn logout_url(
        &self,
        destination: Option<&str>,
        follow: Option<&str>,
        service: Option<&str>,
    ) -> Result<Url, CasError>;

    async fn validate_service_ticket(
        &self,
        ticket: &str,
        service: &str,
    ) -> Result<CasPrincipal, CasError>;
}

/// CAS 2.0 client over HTTP (`/login`, `/logout`, `/serviceValidate`).
#[derive(Clone, Debug)]
pub struct HttpCasClient {
    base_url: Url,
    accepts_logout_service: bool,
    http: reqwest::Client,
}

impl HttpCasClient {
    pub fn new(
        base_url: Url,
        accepts_logout_service: bool,
        timeout: Duration,
    ) -> Result<Self, CasError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            accepts_logout_service,
            http,
        })
    }

    // `https://cas.example.com/cas` + `login` => `https://cas.example.com/cas/login`
    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }
}

#[async_trait]
impl CasClient for HttpCasClient {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn login_url(&self, service: &str) -> Url {
        let mut url = self.endpoint("login");
        url.query_pairs_mut().append_pair("service", service);
        url
    }

    fn accepts_logout_service(&self) -> bool {
        self.accepts_logout_service
    }

    fn logout_url(
        &self,
        destination: Option<&str>,
        follow: Option<&str>,
        service: Option<&str>,
    ) -> Result<Url, CasError> {
        if service.is_some() && !self.accepts_logout_service {
            return Err(CasError::ServiceNotAccepted);
        }

        let mut url = self.endpoint("logout");
        let params = [
            ("destination", destination),
            ("follow", follow),
            ("service", service),
        ];
        if params.iter().any(|(_, v)| v.is_some()) {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                if let Some(value) = value {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    async fn validate_service_ticket(
        &self,
        ticket: &str,
        service: &str,
    ) -> Result<CasPrincipal, CasError> {
        let mut url = self.endpoint("serviceValidate");
        url.query_pairs_mut()
            .append_pair("ticket", ticket)
            .append_pair("service", service);

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let principal = parse_service_response(&body)?;
        tracing::debug!(user = %principal.user, "service ticket validated");
        Ok(principal)
    }
}
