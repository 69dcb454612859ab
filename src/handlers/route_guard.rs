//! Role gate for protected views.
//!
//! A guard is mounted per navigation, shows a neutral placeholder while the
//! access check is pending, and then either renders the protected view or
//! navigates away. Both outcomes are final for that navigation.

use crate::handlers::access_policy::{self, AccessDecision, AllowList};
use crate::handlers::credential_store::CredentialStore;
use log::{debug, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where a denied navigation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Replace the current view with the entry point; history is not pushed.
    EntryPoint,
    /// Return to the previous view.
    Back,
}

impl AccessDecision {
    pub fn navigation(self) -> Option<Navigation> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::DenyNoToken => Some(Navigation::EntryPoint),
            AccessDecision::DenyRoleNotAllowed => Some(Navigation::Back),
        }
    }
}

/// Navigation primitives supplied by the surrounding UI or HTTP layer.
pub trait Navigator {
    fn replace_with_entry_point(&mut self);
    fn go_back(&mut self);
}

/// A page that declares its own allow-list.
pub trait GuardedView {
    type Output;

    fn allowed_roles(&self) -> &AllowList;
    /// Shown while access is being verified. Must not reveal protected content.
    fn placeholder(&self) -> Self::Output;
    fn render(&self) -> Self::Output;
}

/// Performs the navigation for `decision`. Returns true when access is allowed.
pub fn dispatch<N: Navigator + ?Sized>(decision: AccessDecision, navigator: &mut N) -> bool {
    match decision.navigation() {
        None => true,
        Some(Navigation::EntryPoint) => {
            navigator.replace_with_entry_point();
            false
        }
        Some(Navigation::Back) => {
            navigator.go_back();
            false
        }
    }
}

/// Hands out one ticket per navigation; a new navigation invalidates older tickets.
#[derive(Debug, Clone, Default)]
pub struct NavigationTracker {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct NavigationTicket {
    id: u64,
    current: Arc<AtomicU64>,
}

impl NavigationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> NavigationTicket {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        NavigationTicket {
            id,
            current: self.current.clone(),
        }
    }
}

impl NavigationTicket {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    RenderChildren,
    Redirected(Navigation),
    /// The owning navigation ended before the check resolved.
    Discarded,
}

pub struct RouteGuard<'a, V: GuardedView> {
    view: &'a V,
    ticket: NavigationTicket,
    state: GuardState,
}

impl<'a, V: GuardedView> RouteGuard<'a, V> {
    pub fn mount(view: &'a V, ticket: NavigationTicket) -> Self {
        RouteGuard {
            view,
            ticket,
            state: GuardState::Pending,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Placeholder while pending, the view once allowed, nothing otherwise.
    pub fn output(&self) -> Option<V::Output> {
        match self.state {
            GuardState::Pending => Some(self.view.placeholder()),
            GuardState::RenderChildren => Some(self.view.render()),
            GuardState::Redirected(_) | GuardState::Discarded => None,
        }
    }

    /// Runs the access check once. Later calls return the settled state.
    pub fn resolve<S, N>(&mut self, store: &S, navigator: &mut N) -> GuardState
    where
        S: CredentialStore + ?Sized,
        N: Navigator + ?Sized,
    {
        if self.state != GuardState::Pending {
            return self.state;
        }

        let decision = access_policy::evaluate(store, self.view.allowed_roles());

        if !self.ticket.is_current() {
            debug!("Dropping access result for a navigation that already ended");
            self.state = GuardState::Discarded;
            return self.state;
        }

        self.state = match decision.navigation() {
            None => GuardState::RenderChildren,
            Some(navigation) => {
                info!("Access denied ({:?}), navigating to {:?}", decision, navigation);
                GuardState::Redirected(navigation)
            }
        };
        dispatch(decision, navigator);
        self.state
    }
}
