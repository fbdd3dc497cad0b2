//! Navigation guards
//!
//! Pure decisions over a snapshot of auth state. They never touch the network.

use serde::Serialize;

use super::models::{Role, RoleRequirement};

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";

/// What the guard needs to know about the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthSnapshot {
    pub loading: bool,
    pub authenticated: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum GuardDecision {
    /// Session restoration still running; show a pending indicator
    Pending,
    /// Show the requested view
    Render,
    /// Go elsewhere. `from` is the originally requested location, kept so the
    /// login view can send the user back after authenticating.
    Redirect { to: String, from: Option<String> },
}

impl GuardDecision {
    fn to_login(requested: &str) -> Self {
        GuardDecision::Redirect {
            to: LOGIN_PATH.to_string(),
            from: Some(requested.to_string()),
        }
    }

    fn to_landing() -> Self {
        GuardDecision::Redirect {
            to: LANDING_PATH.to_string(),
            from: None,
        }
    }
}

/// Requires any authenticated user
pub fn require_auth(snapshot: &AuthSnapshot, requested: &str) -> GuardDecision {
    if snapshot.loading {
        GuardDecision::Pending
    } else if !snapshot.authenticated {
        GuardDecision::to_login(requested)
    } else {
        GuardDecision::Render
    }
}

/// Requires an authenticated user whose role is in `roles`
pub fn require_role<R>(snapshot: &AuthSnapshot, requested: &str, roles: R) -> GuardDecision
where
    R: RoleRequirement,
{
    match require_auth(snapshot, requested) {
        GuardDecision::Render => match snapshot.role {
            Some(role) if roles.allows(role) => GuardDecision::Render,
            _ => GuardDecision::to_landing(),
        },
        other => other,
    }
}

/// For login/register views: signed-in users go to the landing page
pub fn guest_only(snapshot: &AuthSnapshot) -> GuardDecision {
    if snapshot.loading {
        GuardDecision::Pending
    } else if snapshot.authenticated {
        GuardDecision::to_landing()
    } else {
        GuardDecision::Render
    }
}
