pub mod portal;
pub mod session;

use actix_web::web;

pub use portal::config_portal_routes;
pub use session::config_session_routes;

/// Registers every portal route. Protected scopes redirect to `entry_point`.
pub fn configure(entry_point: String) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        config_session_routes(cfg);
        config_portal_routes(&entry_point, cfg);
    }
}
