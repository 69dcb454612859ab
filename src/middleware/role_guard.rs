use crate::handlers::access_policy::{self, AllowList};
use crate::handlers::credential_store::SessionCredentialStore;
use crate::handlers::route_guard::{dispatch, Navigator};
use actix_session::SessionExt;
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpResponse,
};
use futures_util::future::{ok, Ready};
use log::{info, warn};
use reqwest::Url;
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Middleware gating a route scope by the session's role.
///
/// The check runs before the wrapped service is called, so protected handlers
/// never execute for a denied session.
pub struct RoleGuard {
    allowed: Rc<AllowList>,
    entry_point: Rc<str>,
}

impl RoleGuard {
    pub fn new(allowed: AllowList) -> Self {
        if allowed.is_empty() {
            warn!("[PORTAL-GUARD] empty allow-list, every session will be turned away");
        }
        RoleGuard {
            allowed: Rc::new(allowed),
            entry_point: Rc::from("/"),
        }
    }

    pub fn entry_point(mut self, path: &str) -> Self {
        self.entry_point = Rc::from(path);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RoleGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RoleGuardMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
            entry_point: self.entry_point.clone(),
        })
    }
}

pub struct RoleGuardMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<AllowList>,
    entry_point: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RoleGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let allowed = self.allowed.clone();
        let entry_point = self.entry_point.clone();

        Box::pin(async move {
            let store = SessionCredentialStore::new(req.get_session());
            let decision = access_policy::evaluate(&store, &allowed);

            let mut navigator = RedirectNavigator::new(
                &*entry_point,
                referer_path(&req).as_deref(),
                req.path(),
            );
            if dispatch(decision, &mut navigator) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let location = navigator
                .location()
                .unwrap_or(&*entry_point)
                .to_string();
            let mut roles: Vec<&str> = allowed.roles().collect();
            roles.sort_unstable();
            info!(
                "[PORTAL-GUARD] {} {} denied ({:?}, allowed: {}), redirecting to {}",
                req.method(),
                req.path(),
                decision,
                roles.join(","),
                location
            );
            let response = HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location))
                .finish();
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}

/// Turns guard navigation into an HTTP redirect target.
///
/// Going back uses the same-origin `Referer` path, unless that is missing or
/// points at the page being denied, in which case it falls back to the entry
/// point so a denied page can never redirect to itself.
pub struct RedirectNavigator {
    entry_point: String,
    back: Option<String>,
    location: Option<String>,
}

impl RedirectNavigator {
    pub fn new(entry_point: &str, referer: Option<&str>, current_path: &str) -> Self {
        let back = referer
            .filter(|path| path.split('?').next() != Some(current_path))
            .map(str::to_string);
        RedirectNavigator {
            entry_point: entry_point.to_string(),
            back,
            location: None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Navigator for RedirectNavigator {
    fn replace_with_entry_point(&mut self) {
        self.location = Some(self.entry_point.clone());
    }

    fn go_back(&mut self) {
        self.location = Some(self.back.clone().unwrap_or_else(|| self.entry_point.clone()));
    }
}

/// True for a path browsers resolve against the current origin. Rejects
/// scheme-relative forms such as `//host` and `/\host`.
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

// Path and query of a same-origin Referer; foreign referers are ignored.
fn referer_path(req: &ServiceRequest) -> Option<String> {
    let referer = req.headers().get(header::REFERER)?.to_str().ok()?;
    if referer.starts_with('/') {
        return Some(referer.to_string()).filter(|path| is_local_path(path));
    }

    let referer = Url::parse(referer).ok()?;
    let info = req.connection_info();
    let origin = Url::parse(&format!("{}://{}", info.scheme(), info.host())).ok()?;
    if referer.scheme() != origin.scheme()
        || referer.host_str() != origin.host_str()
        || referer.port_or_known_default() != origin.port_or_known_default()
    {
        return None;
    }

    let mut path = referer.path().to_string();
    if let Some(query) = referer.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path).filter(|path| is_local_path(path))
}
