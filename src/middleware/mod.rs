pub mod request_logger;
pub mod role_guard;
pub mod session;

pub use request_logger::RequestLogger;
pub use role_guard::{RedirectNavigator, RoleGuard};
pub use session::{session_middleware, SESSION_COOKIE_NAME};
