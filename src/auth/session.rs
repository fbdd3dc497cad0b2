//! Session management
//!
//! `AuthManager` is the single source of truth for who is signed in. It is
//! created once, shared by `Arc`, and owns the cached user; tokens live in the
//! client's store so the client can read them on every request.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};
use tracing::{info, warn};

use super::guard::AuthSnapshot;
use super::models::{
    AuthOutcome, AuthPayload, ChangePasswordRequest, LoginRequest, LogoutRequest, ProfileUpdate,
    RegisterRequest, RoleRequirement, User,
};
use super::permissions::role_has_permission;
use crate::client::{ApiClient, ApiRequest, ClearReason};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct AuthState {
    user: Option<User>,
    loading: bool,
}

/// Session manager shared by every consumer of auth state
#[derive(Debug)]
pub struct AuthManager {
    client: Arc<ApiClient>,
    state: RwLock<AuthState>,
}

impl AuthManager {
    /// Create a session manager. Call [`AuthManager::initialize`] to restore a
    /// persisted session; until then the manager reports `loading`.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: RwLock::new(AuthState {
                user: None,
                loading: true,
            }),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_user(&self, user: Option<User>) {
        self.write().user = user;
    }

    /// Restore a session from persisted tokens. Returns whether a user is now
    /// signed in.
    pub async fn initialize(&self) -> bool {
        self.write().loading = true;

        let has_tokens =
            self.client.has_session() || matches!(self.client.refresh_token(), Ok(Some(_)));

        let restored = if has_tokens {
            match self.fetch_persisted_user().await {
                Ok(user) => {
                    info!("Restored session for {}", user.email);
                    Some(user)
                }
                // 401s were already handled by the client; other client errors
                // mean the stored session is unusable. Network and server
                // faults keep the tokens for the next attempt.
                Err(Error::Api(e)) if e.status.is_some_and(|s| s < 500) => {
                    warn!("Could not restore session: {}", e);
                    if self.client.has_session() {
                        self.client.clear_session(ClearReason::RestoreFailed);
                    }
                    None
                }
                Err(e) => {
                    warn!("Could not reach the server to restore session: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut state = self.write();
        state.user = restored;
        state.loading = false;
        state.user.is_some()
    }

    /// Fetch the user behind the stored tokens. A lone refresh token is
    /// exchanged for an access token first.
    async fn fetch_persisted_user(&self) -> Result<User> {
        if !self.client.has_session() {
            info!("No access token stored, refreshing before restore");
            self.client.refresh_access_token(None).await?;
        }
        self.client.get("/users/me").await
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// The cached user, provided the session tokens still exist. If the
    /// client dropped the session behind our back the cache is cleared too.
    pub fn current_user(&self) -> Option<User> {
        if !self.client.has_session() {
            let mut state = self.write();
            if state.user.take().is_some() {
                info!("Session ended elsewhere, dropping cached user");
            }
            return None;
        }
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let user = self.current_user();
        AuthSnapshot {
            loading: self.is_loading(),
            authenticated: user.is_some(),
            role: user.map(|u| u.role),
        }
    }

    /// True if the current user's role is in `roles`; false without a user
    pub fn has_role<R: RoleRequirement>(&self, roles: R) -> bool {
        self.current_user().is_some_and(|user| roles.allows(user.role))
    }

    /// Look `key` up in the permission table for the current user's role
    pub fn has_permission(&self, key: &str) -> bool {
        self.current_user()
            .is_some_and(|user| role_has_permission(user.role, key))
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let result = async {
            let request = ApiRequest::post("/auth/login").json(&LoginRequest { email, password })?;
            self.establish(request).await
        }
        .await;

        match result {
            Ok(user) => {
                info!("Logged in as {} ({})", user.email, user.role);
                AuthOutcome::ok(user)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                AuthOutcome::failed(e.to_api_error())
            }
        }
    }

    pub async fn register(&self, data: &RegisterRequest) -> AuthOutcome {
        let result = async {
            let request = ApiRequest::post("/auth/register").json(data)?;
            self.establish(request).await
        }
        .await;

        match result {
            Ok(user) => {
                info!("Registered {} ({})", user.email, user.role);
                AuthOutcome::ok(user)
            }
            Err(e) => {
                warn!("Registration failed for {}: {}", data.email, e);
                AuthOutcome::failed(e.to_api_error())
            }
        }
    }

    async fn establish(&self, request: ApiRequest) -> Result<User> {
        let payload: AuthPayload = self.client.send_public(request).await?;
        self.client
            .set_tokens(&payload.access_token, Some(&payload.refresh_token))?;
        self.set_user(Some(payload.user.clone()));
        Ok(payload.user)
    }

    /// Revoke the refresh token server-side if possible, then always clear
    /// local state.
    pub async fn logout(&self) {
        if let Ok(Some(refresh_token)) = self.client.refresh_token() {
            let revoke = self
                .client
                .post::<_, ()>(
                    "/auth/logout",
                    &LogoutRequest {
                        refresh_token: &refresh_token,
                    },
                )
                .await;
            if let Err(e) = revoke {
                warn!("Server-side logout failed, clearing local session anyway: {}", e);
            }
        }
        self.end_session();
    }

    /// Revoke every session of this user, then clear local state
    pub async fn logout_all(&self) -> Result<()> {
        let result = self.client
            .post::<_, ()>("/auth/logout-all", &serde_json::json!({}))
            .await;
        if let Err(e) = &result {
            warn!("Server-side logout-all failed: {}", e);
        }
        self.end_session();
        result
    }

    fn end_session(&self) {
        self.client.clear_session(ClearReason::Logout);
        self.set_user(None);
        info!("Logged out");
    }

    pub async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        self.require_session()?;
        if new.len() < 8 {
            return Err(Error::InvalidInput(
                "new password must be at least 8 characters".to_string(),
            ));
        }
        self.client
            .put::<_, ()>(
                "/auth/change-password",
                &ChangePasswordRequest {
                    current_password: current,
                    new_password: new,
                },
            )
            .await
    }

    /// Re-fetch the current user from the server
    pub async fn refresh_user(&self) -> Result<User> {
        self.require_session()?;
        let user: User = self.client.get("/users/me").await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.require_session()?;
        let user: User = self.client.put("/users/me", update).await?;
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    fn require_session(&self) -> Result<()> {
        if self.client.has_session() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }
}
