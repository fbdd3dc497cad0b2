//! Fixed permission table

use super::models::Role;
use super::models::Role::{Administrador, Docente, Estudiante, SuperAdmin};

const STAFF: &[Role] = &[Docente, Administrador, SuperAdmin];
const ADMINS: &[Role] = &[Administrador, SuperAdmin];
const EVERYONE: &[Role] = &[Estudiante, Docente, Administrador, SuperAdmin];

/// Permission key → roles allowed to exercise it
pub const PERMISSIONS: &[(&str, &[Role])] = &[
    ("videos.create", STAFF),
    ("videos.edit", STAFF),
    ("videos.delete", ADMINS),
    ("comments.moderate", STAFF),
    ("posts.create", EVERYONE),
    ("posts.moderate", ADMINS),
    ("users.manage", ADMINS),
    ("users.change_role", &[SuperAdmin]),
    ("badges.manage", ADMINS),
    ("badges.award", STAFF),
    ("categories.manage", ADMINS),
    ("admin.dashboard", ADMINS),
];

/// Roles allowed for `key`, or `None` for an unknown key
pub fn allowed_roles(key: &str) -> Option<&'static [Role]> {
    PERMISSIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, roles)| *roles)
}

/// Unknown keys are denied
pub fn role_has_permission(role: Role, key: &str) -> bool {
    allowed_roles(key).is_some_and(|roles| roles.contains(&role))
}
