use crate::config::PortalConfig;
use actix_session::{config::BrowserSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};

pub const SESSION_COOKIE_NAME: &str = "gym_portal_session";

/// Signed cookie session holding the credential store keys.
///
/// The cookie lives for the browser session only, so credentials vanish when
/// the browser is closed.
pub fn session_middleware(config: &PortalConfig) -> SessionMiddleware<CookieSessionStore> {
    let secret_key = Key::from(config.session_secret.as_bytes());

    SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_path("/".to_string())
        .cookie_secure(config.cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(BrowserSession::default())
        .build()
}
