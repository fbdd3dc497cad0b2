//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ApiError, Error};

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Student - consumes content, comments, posts
    Estudiante,
    /// Instructor - publishes videos and moderates comments
    Docente,
    /// Administrator - manages users, categories and badges
    Administrador,
    /// Super administrator - everything, including role changes
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Estudiante,
        Role::Docente,
        Role::Administrador,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Estudiante => "Estudiante",
            Role::Docente => "Docente",
            Role::Administrador => "Administrador",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown role '{}'", s)))
    }
}

/// A set of roles a check accepts. Implemented for a single role and for
/// slices, arrays and vectors of roles.
pub trait RoleRequirement {
    fn allows(&self, role: Role) -> bool;
}

impl RoleRequirement for Role {
    fn allows(&self, role: Role) -> bool {
        *self == role
    }
}

impl RoleRequirement for [Role] {
    fn allows(&self, role: Role) -> bool {
        self.contains(&role)
    }
}

impl<const N: usize> RoleRequirement for [Role; N] {
    fn allows(&self, role: Role) -> bool {
        self.contains(&role)
    }
}

impl RoleRequirement for Vec<Role> {
    fn allows(&self, role: Role) -> bool {
        self.contains(&role)
    }
}

impl<T: RoleRequirement + ?Sized> RoleRequirement for &T {
    fn allows(&self, role: Role) -> bool {
        (**self).allows(role)
    }
}

/// User information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Administrador | Role::SuperAdmin) && self.active
    }
}

/// Login credentials
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Account creation payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// What login and register return
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest<'a> {
    pub refresh_token: &'a str,
}

/// Editable profile fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Result of login/register. Failures are reported here rather than returned
/// as errors so callers can render them directly.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl AuthOutcome {
    pub fn ok(user: User) -> Self {
        Self {
            success: true,
            user: Some(user),
            error: None,
        }
    }

    pub fn failed(error: ApiError) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SuperAdmin\"");
        let role: Role = serde_json::from_str("\"Docente\"").unwrap();
        assert_eq!(role, Role::Docente);
    }

    #[test]
    fn test_role_from_str_ignores_case() {
        assert_eq!("estudiante".parse::<Role>().unwrap(), Role::Estudiante);
        assert!("Rector".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_requirement_forms() {
        assert!(Role::Docente.allows(Role::Docente));
        assert!(!Role::Docente.allows(Role::Estudiante));
        assert!([Role::Administrador, Role::SuperAdmin].allows(Role::SuperAdmin));
        assert!(vec![Role::Estudiante].allows(Role::Estudiante));
        let slice: &[Role] = &[Role::Docente];
        assert!(!slice.allows(Role::SuperAdmin));
    }

    #[test]
    fn test_user_defaults_when_fields_missing() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","name":"Ana","email":"a@x.com","role":"Estudiante"}"#,
        )
        .unwrap();
        assert!(user.active);
        assert!(user.avatar.is_none());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_inactive_admin_is_not_admin() {
        let mut user: User = serde_json::from_str(
            r#"{"id":"u2","name":"Root","email":"r@x.com","role":"SuperAdmin"}"#,
        )
        .unwrap();
        assert!(user.is_admin());
        user.active = false;
        assert!(!user.is_admin());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            bio: Some("Profe de física".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"bio": "Profe de física"}));
    }
}
