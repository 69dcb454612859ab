//! Gym portal server: session-scoped role gating for protected pages and a
//! bearer-token client for the gym services API.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

pub use config::PortalConfig;
pub use errors::{ApiError, ConfigError, DecodeError, LoginError, StoreError};
pub use handlers::access_policy::{evaluate, evaluate_at, AccessDecision, AllowList};
pub use handlers::api_client::ApiClient;
pub use handlers::auth::TokenDecoder;
pub use handlers::credential_store::{
    CredentialStore, MemoryCredentialStore, SessionCredentialStore,
};
pub use handlers::route_guard::{
    GuardState, GuardedView, Navigation, NavigationTracker, Navigator, RouteGuard,
};
pub use state::PortalState;
