use crate::errors::ConfigError;
use crate::middleware::role_guard::is_local_path;
use crate::routes::portal::is_guarded;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_ENTRY_POINT: &str = "/";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
// actix's cookie Key needs at least this much material
const MIN_SESSION_SECRET_LEN: usize = 64;

/// Runtime settings for the portal server.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub bind_addr: String,
    pub api_base_url: String,
    pub session_secret: String,
    pub jwt_secret: Option<String>,
    pub entry_point: String,
    pub http_timeout: Duration,
    pub cookie_secure: bool,
}

impl PortalConfig {
    /// Reads the configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = non_empty("PORTAL_API_BASE_URL")
            .ok_or(ConfigError::Missing("PORTAL_API_BASE_URL"))?;
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "PORTAL_API_BASE_URL",
                reason: format!("expected an http(s) URL, got {}", api_base_url),
            });
        }

        let session_secret =
            non_empty("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: format!("must be at least {} bytes", MIN_SESSION_SECRET_LEN),
            });
        }

        let entry_point =
            non_empty("PORTAL_ENTRY_POINT").unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string());
        if !is_local_path(&entry_point) {
            return Err(ConfigError::Invalid {
                key: "PORTAL_ENTRY_POINT",
                reason: format!("must be an absolute path on this host, got {}", entry_point),
            });
        }
        // a guarded entry point would redirect denied sessions back to itself
        if is_guarded(&entry_point) {
            return Err(ConfigError::Invalid {
                key: "PORTAL_ENTRY_POINT",
                reason: format!("{} is behind a role guard", entry_point),
            });
        }

        let http_timeout = match non_empty("PORTAL_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "PORTAL_HTTP_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let cookie_secure = match non_empty("PORTAL_COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "PORTAL_COOKIE_SECURE",
                reason: format!("expected true or false, got {}", raw),
            })?,
            None => true,
        };

        Ok(PortalConfig {
            bind_addr: non_empty("PORTAL_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            session_secret,
            jwt_secret: non_empty("PORTAL_JWT_SECRET"),
            entry_point,
            http_timeout,
            cookie_secure,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
