/*
 * Responsibility
 * - Read environment settings (CAS URLs, single sign-out switch, logout policy, session index backend)
 * - Validate them (fail start-up on anything missing or malformed)
 * - Built once at start-up and shared read-only afterwards
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use url::Url;

use crate::services::cas::{LogoutPolicy, LogoutUrlParam};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where session index records and local sessions live.
/// `Valkey` shares both across instances; `Memory` keeps them per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIndexBackend {
    Memory,
    Valkey,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub cas: CasConfig,

    pub session_index_backend: SessionIndexBackend,
    pub valkey_url: Option<String>,
}

/// Everything the CAS handlers need at request time.
#[derive(Debug, Clone)]
pub struct CasConfig {
    pub base_url: Url,
    // Where the CAS routes are mounted, e.g. `/users`
    pub mount_path: String,
    pub enable_single_sign_out: bool,
    // CAS clients that cannot take a service parameter on logout
    pub legacy_logout: bool,
    pub logout: LogoutPolicy,
    pub after_sign_in_path: String,
    pub public_scheme: String,
    pub session_max_age_seconds: u64,
    pub ticket_relay_ttl_seconds: u64,
    pub validate_timeout_seconds: u64,
}

impl CasConfig {
    /// Path of the ticket-return endpoint (also where CAS posts logout requests).
    pub fn service_path(&self) -> String {
        format!("{}/service", self.mount_path)
    }

    pub fn cas_base_str(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let base_url = std::env::var("CAS_BASE_URL")
            .map_err(|_| ConfigError::Missing("CAS_BASE_URL"))?;
        let base_url = parse_http_url(&base_url).ok_or(ConfigError::Invalid("CAS_BASE_URL"))?;

        let mount_path = normalize_mount_path(
            &std::env::var("CAS_MOUNT_PATH").unwrap_or_else(|_| "/users".to_string()),
        );

        let enable_single_sign_out = env_flag("CAS_ENABLE_SINGLE_SIGN_OUT")?;
        let legacy_logout = env_flag("CAS_LEGACY_LOGOUT")?;

        let param = std::env::var("CAS_LOGOUT_URL_PARAM")
            .unwrap_or_default()
            .parse::<LogoutUrlParam>()
            .map_err(|_| ConfigError::Invalid("CAS_LOGOUT_URL_PARAM"))?;

        let destination_url = optional_url("CAS_DESTINATION_URL")?;
        let follow_url = optional_url("CAS_FOLLOW_URL")?;

        let after_sign_in_path =
            std::env::var("AFTER_SIGN_IN_PATH").unwrap_or_else(|_| "/".to_string());
        let after_sign_out_path =
            std::env::var("AFTER_SIGN_OUT_PATH").unwrap_or_else(|_| "/".to_string());

        let public_scheme = match std::env::var("PUBLIC_SCHEME")
            .unwrap_or_else(|_| "http".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "http" => "http".to_string(),
            "https" => "https".to_string(),
            _ => return Err(ConfigError::Invalid("PUBLIC_SCHEME")),
        };

        let session_index_backend = match std::env::var("SESSION_INDEX_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => SessionIndexBackend::Memory,
            "valkey" | "redis" => SessionIndexBackend::Valkey,
            _ => return Err(ConfigError::Invalid("SESSION_INDEX_BACKEND")),
        };

        let valkey_url = std::env::var("VALKEY_URL").ok().filter(|s| !s.is_empty());
        if session_index_backend == SessionIndexBackend::Valkey && valkey_url.is_none() {
            return Err(ConfigError::Missing("VALKEY_URL"));
        }

        let session_max_age_seconds = env_seconds("SESSION_MAX_AGE_SECONDS", 86_400)?;
        let ticket_relay_ttl_seconds = env_seconds("TICKET_RELAY_TTL_SECONDS", 300)?;
        let validate_timeout_seconds = env_seconds("CAS_VALIDATE_TIMEOUT_SECONDS", 10)?;

        Ok(Self {
            addr,
            app_env,
            cas: CasConfig {
                base_url,
                mount_path,
                enable_single_sign_out,
                legacy_logout,
                logout: LogoutPolicy {
                    param,
                    destination_url,
                    follow_url,
                    after_sign_out_path,
                },
                after_sign_in_path,
                public_scheme,
                session_max_age_seconds,
                ticket_relay_ttl_seconds,
                validate_timeout_seconds,
            },
            session_index_backend,
            valkey_url,
        })
    }
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

// `users/` => `/users`, `/` => ``
fn normalize_mount_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn env_flag(key: &'static str) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Err(_) => Ok(false),
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

fn env_seconds(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_seconds(key, std::env::var(key).ok().as_deref(), default)
}

// Durations must be positive: a zero TTL or timeout expires everything at once.
fn parse_seconds(key: &'static str, raw: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => match v.parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid(key)),
            Ok(seconds) => Ok(seconds),
        },
    }
}

fn optional_url(key: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => parse_http_url(&v)
            .map(|_| Some(v.trim().to_string()))
            .ok_or(ConfigError::Invalid(key)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_path_is_normalized() {
        assert_eq!(normalize_mount_path("users"), "/users");
        assert_eq!(normalize_mount_path("/users/"), "/users");
        assert_eq!(normalize_mount_path("/"), "");
    }

    #[test]
    fn only_http_urls_are_accepted() {
        assert!(parse_http_url("https://cas.example.com/cas").is_some());
        assert!(parse_http_url("ftp://cas.example.com").is_none());
        assert!(parse_http_url("not a url").is_none());
    }

    #[test]
    fn durations_must_be_positive_numbers() {
        const KEY: &str = "TICKET_RELAY_TTL_SECONDS";
        assert_eq!(parse_seconds(KEY, None, 300).unwrap(), 300);
        assert_eq!(parse_seconds(KEY, Some(" "), 300).unwrap(), 300);
        assert_eq!(parse_seconds(KEY, Some("60"), 300).unwrap(), 60);
        assert!(matches!(
            parse_seconds(KEY, Some("0"), 300),
            Err(ConfigError::Invalid(KEY))
        ));
        assert!(matches!(
            parse_seconds(KEY, Some("five"), 300),
            Err(ConfigError::Invalid(KEY))
        ));
    }
}
