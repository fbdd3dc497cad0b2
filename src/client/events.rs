//! Session lifecycle notifications
//!
//! The client cannot navigate anywhere itself. Instead it broadcasts what
//! happened to the session, and front-ends decide how to react (the CLI
//! prints a hint, a UI would route to the login view).

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// The user logged out
    Logout,
    /// The refresh call failed or no refresh token was stored
    RefreshFailed,
    /// The server rejected the token for a reason other than expiry
    InvalidToken,
    /// Persisted tokens could not be turned back into a session
    RestoreFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh succeeded and a new access token was stored
    TokenRefreshed,
    /// Tokens were removed from storage
    SessionCleared(ClearReason),
    /// The user must be sent to the login view
    RedirectToLogin,
}

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
