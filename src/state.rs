use crate::config::PortalConfig;
use crate::handlers::api_client::{build_http_client, ApiClient};
use crate::handlers::auth::TokenDecoder;
use crate::handlers::credential_store::{MemoryCredentialStore, SessionCredentialStore};
use actix_session::Session;
use reqwest::Client;

/// Shared application data handed to every worker.
#[derive(Clone)]
pub struct PortalState {
    pub config: PortalConfig,
    pub http: Client,
    pub decoder: TokenDecoder,
}

impl PortalState {
    pub fn new(config: PortalConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config.http_timeout)?;
        let decoder = TokenDecoder::from_optional_secret(config.jwt_secret.as_deref());
        Ok(PortalState {
            config,
            http,
            decoder,
        })
    }

    /// API client bound to the caller's session credentials.
    pub fn api_client(&self, session: Session) -> ApiClient<SessionCredentialStore> {
        ApiClient::new(
            self.http.clone(),
            self.config.api_base_url.clone(),
            SessionCredentialStore::new(session),
        )
    }

    /// API client that never sends a bearer token, for signing in.
    pub fn anonymous_client(&self) -> ApiClient<MemoryCredentialStore> {
        ApiClient::new(
            self.http.clone(),
            self.config.api_base_url.clone(),
            MemoryCredentialStore::new(),
        )
    }
}
