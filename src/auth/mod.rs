//! Authentication and session management

pub mod claims;
pub mod guard;
pub mod models;
pub mod permissions;
pub mod session;

pub use claims::{decode_unverified, Claims};
pub use guard::{guest_only, require_auth, require_role, AuthSnapshot, GuardDecision};
pub use models::{AuthOutcome, ProfileUpdate, RegisterRequest, Role, RoleRequirement, User};
pub use permissions::role_has_permission;
pub use session::AuthManager;
