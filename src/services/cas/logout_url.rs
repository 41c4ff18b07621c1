//! CAS logout redirect composition.
//!
//! `destination` and `follow` are two spellings of "where CAS should send the
//! browser after logging out"; which one a CAS server understands is a
//! deployment choice, so the policy picks at most one of them.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::services::cas::client::{CasClient, CasError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoutUrlParam {
    #[default]
    None,
    Destination,
    Follow,
}

impl FromStr for LogoutUrlParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "destination" => Ok(Self::Destination),
            "follow" => Ok(Self::Follow),
            other => Err(format!("unknown logout url param: {other}")),
        }
    }
}

impl fmt::Display for LogoutUrlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Destination => "destination",
            Self::Follow => "follow",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutPolicy {
    pub param: LogoutUrlParam,
    pub destination_url: Option<String>,
    pub follow_url: Option<String>,
    pub after_sign_out_path: String,
}

impl LogoutPolicy {
    // Override when configured, else back to this app's after-sign-out page.
    fn target(&self, mode: LogoutUrlParam, request_url: &str) -> Option<String> {
        if self.param != mode {
            return None;
        }
        let override_url = match mode {
            LogoutUrlParam::Destination => self.destination_url.as_deref(),
            LogoutUrlParam::Follow => self.follow_url.as_deref(),
            LogoutUrlParam::None => return None,
        };
        match override_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => Some(url.to_string()),
            None => Some(format!("{request_url}{}", self.after_sign_out_path)),
        }
    }

    pub fn destination(&self, request_url: &str) -> Option<String> {
        self.target(LogoutUrlParam::Destination, request_url)
    }

    pub fn follow(&self, request_url: &str) -> Option<String> {
        self.target(LogoutUrlParam::Follow, request_url)
    }
}

/// Build the URL that sends the browser to the CAS logout endpoint.
///
/// The service parameter is only passed to clients that advertise support for it.
pub fn build<F>(
    policy: &LogoutPolicy,
    request_url: &str,
    service_url: F,
    client: &dyn CasClient,
) -> Result<Url, CasError>
where
    F: Fn(&str) -> String,
{
    let destination = policy.destination(request_url);
    let follow = policy.follow(request_url);
    let service = client
        .accepts_logout_service()
        .then(|| service_url(request_url));

    client.logout_url(destination.as_deref(), follow.as_deref(), service.as_deref())
}
