use crate::errors::ApiError;
use crate::handlers::credential_store::CredentialStore;
use crate::models::all_models::{Configuration, ConfigurationUpdate, LoginRequest, LoginResponse};
use log::{debug, error};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Builds the shared HTTP transport used by every [`ApiClient`].
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("gym-portal/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Client for the gym services API that carries the session's bearer token.
///
/// Every call reads the credential store afresh; nothing is cached, retried
/// or de-duplicated.
#[derive(Clone)]
pub struct ApiClient<S> {
    client: Client,
    base_url: String,
    store: S,
}

impl<S: CredentialStore> ApiClient<S> {
    pub fn new(client: Client, base_url: impl Into<String>, store: S) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            client,
            base_url,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // Attaches the session token; a store that cannot be read rejects the call.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let credentials = self.store.get()?;

        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = credentials.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Gym API responded with {}: {}", status, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?;
        self.send(builder).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send(builder).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path)?.json(body);
        self.send(builder).await
    }

    //Get Configurations
    //Get Configurations Output: Vec<Configuration>
    pub async fn get_configurations(&self) -> Result<Vec<Configuration>, ApiError> {
        self.get_json("/configurations").await
    }

    //Get Configuration
    //Get Configuration Input: configuration id
    pub async fn get_configuration(&self, id: &str) -> Result<Configuration, ApiError> {
        self.get_json(&format!("/configurations/{}", id)).await
    }

    //Update Configuration
    //Update Configuration Input: configuration id, ConfigurationUpdate
    pub async fn update_configuration(
        &self,
        id: &str,
        update: &ConfigurationUpdate,
    ) -> Result<Configuration, ApiError> {
        self.put_json(&format!("/configurations/{}", id), update)
            .await
    }

    //Authenticate
    //Authenticate Input: LoginRequest
    //Authenticate Output: LoginResponse (token issued by the identity service)
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json("/auth/login", request).await
    }
}
