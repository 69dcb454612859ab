use crate::errors::LoginError;
use crate::handlers::credential_store::{self, CredentialStore, SessionCredentialStore};
use crate::models::all_models::LoginRequest;
use crate::state::PortalState;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use chrono::Utc;
use log::{error, warn};
use serde::Serialize;

//Session Response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub user_name: String,
    pub name: String,
    pub role: String,
    pub specialty: Option<String>,
    pub expires_at: i64,
}

//Entry Point
pub async fn entry_point(session: Session) -> impl Responder {
    let store = SessionCredentialStore::new(session);
    let signed_in = matches!(store.get(), Ok(credentials) if credentials.token.is_some());
    HttpResponse::Ok().json(serde_json::json!({
        "page": "login",
        "signedIn": signed_in,
    }))
}

//Login
//Login Input: LoginRequest
//Login Output: SessionResponse
pub async fn login(
    state: web::Data<PortalState>,
    session: Session,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    // A failed attempt must not leave the previous user signed in
    let store = SessionCredentialStore::new(session);
    let discard_previous = || {
        if let Err(e) = credential_store::logout(&store) {
            error!("Failed to clear session credentials: {}", e);
        }
    };

    // Ask the identity service for a token, without the old session's bearer
    let issued = match state.anonymous_client().authenticate(&payload).await {
        Ok(issued) => issued,
        Err(e) => {
            warn!(
                "Login for {} failed (status {:?}): {}",
                payload.user_name,
                e.status(),
                e
            );
            discard_previous();
            return e.error_response();
        }
    };

    // Decode once and cache role and expiry in the session
    match credential_store::login(&store, &state.decoder, &issued.token) {
        Ok(claims) => HttpResponse::Ok().json(SessionResponse {
            id: claims.id,
            user_name: claims.user_name,
            name: claims.name,
            role: claims.role,
            specialty: claims.specialty,
            expires_at: claims.exp,
        }),
        Err(LoginError::Decode(e)) => {
            warn!("Identity service issued an unusable token: {}", e);
            discard_previous();
            HttpResponse::Unauthorized().json("Invalid login token")
        }
        Err(LoginError::Store(e)) => {
            error!("Failed to store session credentials: {}", e);
            discard_previous();
            HttpResponse::InternalServerError().json("Failed to create session")
        }
    }
}

//Current Session
//Current Session Output: stored role and expiry
pub async fn current_session(session: Session) -> impl Responder {
    let store = SessionCredentialStore::new(session);
    match store.get() {
        Ok(credentials) if credentials.token.is_some() => {
            let expired = credentials
                .expires_at
                .map(|exp| exp <= Utc::now().timestamp())
                .unwrap_or(false);
            if expired {
                return HttpResponse::Unauthorized().json("Session expired");
            }
            HttpResponse::Ok().json(serde_json::json!({
                "role": credentials.role,
                "expiresAt": credentials.expires_at,
            }))
        }
        Ok(_) => HttpResponse::Unauthorized().json("Not authenticated"),
        Err(e) => {
            error!("Failed to read session credentials: {}", e);
            HttpResponse::InternalServerError().json("Session unreadable")
        }
    }
}

// Logout endpoint
pub async fn logout(session: Session) -> impl Responder {
    let store = SessionCredentialStore::new(session);
    match credential_store::logout(&store) {
        Ok(()) => HttpResponse::Ok().json("Logged out successfully"),
        Err(e) => {
            error!("Failed to clear session credentials: {}", e);
            HttpResponse::InternalServerError().json("Failed to log out")
        }
    }
}

//Config Session Routes
// GET /
// GET /session
// POST /session/login
// POST /session/logout
pub fn config_session_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(entry_point)).service(
        web::scope("/session")
            .route("", web::get().to(current_session))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout)),
    );
}
