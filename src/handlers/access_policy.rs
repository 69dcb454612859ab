use crate::handlers::credential_store::CredentialStore;
use crate::models::all_models::PortalRole;
use chrono::Utc;
use log::warn;
use std::collections::HashSet;

/// Roles permitted to reach one protected route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    roles: HashSet<String>,
}

impl AllowList {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        AllowList {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn of(roles: &[PortalRole]) -> Self {
        Self::new(roles.iter().map(|r| r.to_string()))
    }

    pub fn permits(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    DenyNoToken,
    DenyRoleNotAllowed,
}

impl AccessDecision {
    pub fn is_allowed(self) -> bool {
        self == AccessDecision::Allow
    }
}

pub fn evaluate<S>(store: &S, allowed: &AllowList) -> AccessDecision
where
    S: CredentialStore + ?Sized,
{
    evaluate_at(store, allowed, Utc::now().timestamp())
}

/// Decides access against the stored role at time `now` (seconds since epoch).
///
/// The stored role is trusted for the whole session; the token itself is not
/// decoded again. An expired entry counts as no token at all.
pub fn evaluate_at<S>(store: &S, allowed: &AllowList, now: i64) -> AccessDecision
where
    S: CredentialStore + ?Sized,
{
    let credentials = match store.get() {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!("Credential store unreadable, treating as signed out: {}", e);
            return AccessDecision::DenyNoToken;
        }
    };

    if credentials.token.is_none() {
        return AccessDecision::DenyNoToken;
    }

    if let Some(expires_at) = credentials.expires_at {
        if expires_at <= now {
            return AccessDecision::DenyNoToken;
        }
    }

    match credentials.role {
        Some(role) if allowed.permits(&role) => AccessDecision::Allow,
        _ => AccessDecision::DenyRoleNotAllowed,
    }
}
