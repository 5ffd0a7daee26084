//! Guard decisions and the main-subtree entry guard.

use super::history::NavTarget;
use super::route::LOGIN;
use crate::session::Session;

/// Outcome of a guard for one navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Proceed as requested
    Next,
    /// Re-issue the same navigation with replace semantics
    Replay,
    /// Abandon and go elsewhere
    Redirect(NavTarget),
}

impl GuardDecision {
    pub fn to_login() -> Self {
        GuardDecision::Redirect(NavTarget::name(LOGIN))
    }
}

/// Before-navigation guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    RoutesPending,
    RoutesReady,
}

/// Entry guard of the main subtree: a present, non-blank credential is
/// required. Otherwise the session auth state is cleared and the
/// navigation is sent to the login page.
pub async fn enter_main(session: &Session) -> GuardDecision {
    if session.has_credential().await {
        GuardDecision::Next
    } else {
        tracing::info!("No session credential, redirecting to login");
        session.clear_login_info().await;
        GuardDecision::to_login()
    }
}
