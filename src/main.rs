use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use gym_portal::middleware::{session_middleware, RequestLogger};
use gym_portal::{routes, PortalConfig, PortalState};
use log::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("=== Gym Portal Starting ===");

    let config = PortalConfig::from_env().context("Invalid portal configuration")?;
    let state = PortalState::new(config.clone()).context("Failed to build HTTP client")?;

    if state.decoder.verifies_signature() {
        info!("Login tokens are verified with PORTAL_JWT_SECRET");
    } else {
        warn!("PORTAL_JWT_SECRET not set, login tokens are trusted without signature checks");
    }
    if !config.cookie_secure {
        warn!("Session cookie is sent without the Secure flag");
    }

    info!(
        "Serving on {} against API {}",
        config.bind_addr, config.api_base_url
    );

    let bind_addr = config.bind_addr.clone();
    let state = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(session_middleware(&config))
            .wrap(RequestLogger)
            .wrap(Logger::new(
                "%t [%s] \"%r\" %b %D ms \"%{Referer}i\" \"%{User-Agent}i\" %a",
            ))
            .configure(routes::configure(config.entry_point.clone()))
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await
    .context("Server terminated with an error")?;

    Ok(())
}
