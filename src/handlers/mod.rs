pub mod access_policy;
pub mod api_client;
pub mod auth;
pub mod credential_store;
pub mod route_guard;
