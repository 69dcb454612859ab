use crate::errors::ApiError;
use crate::handlers::access_policy::AllowList;
use crate::middleware::role_guard::RoleGuard;
use crate::models::all_models::{ConfigurationUpdate, PortalRole};
use crate::state::PortalState;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::Value;

//Get Configurations
//Get Configurations Output: Vec<Configuration>
pub async fn list_configurations(
    state: web::Data<PortalState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    let configurations = state.api_client(session).get_configurations().await?;
    Ok(HttpResponse::Ok().json(configurations))
}

//Get Configuration
//Get Configuration Input: Path(id)
pub async fn get_configuration(
    state: web::Data<PortalState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let configuration = state
        .api_client(session)
        .get_configuration(&path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(configuration))
}

//Update Configuration
//Update Configuration Input: Path(id), ConfigurationUpdate
pub async fn update_configuration(
    state: web::Data<PortalState>,
    session: Session,
    path: web::Path<String>,
    payload: web::Json<ConfigurationUpdate>,
) -> Result<HttpResponse, ApiError> {
    let configuration = state
        .api_client(session)
        .update_configuration(&path.into_inner(), &payload)
        .await?;
    Ok(HttpResponse::Ok().json(configuration))
}

//Get Schedule
//Get Schedule Output: class schedule from the gym API
pub async fn get_schedule(
    state: web::Data<PortalState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    let schedule: Value = state.api_client(session).get_json("/schedules").await?;
    Ok(HttpResponse::Ok().json(schedule))
}

//Get Equipment Loans
//Get Equipment Loans Output: open equipment loans from the gym API
pub async fn get_equipment_loans(
    state: web::Data<PortalState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    let loans: Value = state
        .api_client(session)
        .get_json("/equipment-loans")
        .await?;
    Ok(HttpResponse::Ok().json(loans))
}

pub const ADMIN_SCOPE: &str = "/admin";
pub const SCHEDULE_SCOPE: &str = "/schedule";
pub const LOANS_SCOPE: &str = "/loans";
/// Every path prefix wrapped in a [`RoleGuard`].
pub const GUARDED_SCOPES: [&str; 3] = [ADMIN_SCOPE, SCHEDULE_SCOPE, LOANS_SCOPE];

/// True when `path` would be handled by one of the guarded scopes.
pub fn is_guarded(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    GUARDED_SCOPES.iter().any(|scope| {
        path.strip_prefix(scope)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn guard(roles: &[PortalRole], entry_point: &str) -> RoleGuard {
    RoleGuard::new(AllowList::of(roles)).entry_point(entry_point)
}

//Config Portal Routes
// GET /admin/configurations          ADMIN
// GET /admin/configurations/{id}     ADMIN
// PUT /admin/configurations/{id}     ADMIN
// GET /schedule                      ADMIN, TRAINER, STUDENT
// GET /loans                         ADMIN, TRAINER
pub fn config_portal_routes(entry_point: &str, cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(ADMIN_SCOPE)
            .wrap(guard(&[PortalRole::Admin], entry_point))
            .route("/configurations", web::get().to(list_configurations))
            .route("/configurations/{id}", web::get().to(get_configuration))
            .route("/configurations/{id}", web::put().to(update_configuration)),
    )
    .service(
        web::scope(SCHEDULE_SCOPE)
            .wrap(guard(
                &[PortalRole::Admin, PortalRole::Trainer, PortalRole::Student],
                entry_point,
            ))
            .route("", web::get().to(get_schedule)),
    )
    .service(
        web::scope(LOANS_SCOPE)
            .wrap(guard(&[PortalRole::Admin, PortalRole::Trainer], entry_point))
            .route("", web::get().to(get_equipment_loans)),
    );
}
