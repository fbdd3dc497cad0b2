//! User administration

use serde::Serialize;

use super::resource_path;
use crate::auth::{ProfileUpdate, Role, User};
use crate::client::{ApiClient, ApiRequest, Page, PageRequest};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub page: PageRequest,
    pub role: Option<Role>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
struct RoleChange {
    role: Role,
}

#[derive(Debug, Serialize)]
struct StatusChange {
    active: bool,
}

pub struct UserService<'a> {
    client: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Page<Vec<User>>> {
        let request = ApiRequest::get("/users")
            .queries(filter.page.to_query())
            .query_opt("role", filter.role.map(|r| r.as_str()))
            .query_opt("search", filter.search.as_deref().filter(|s| !s.trim().is_empty()));
        self.client.fetch_page(request).await
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.client.get(&resource_path("/users", id)?).await
    }

    pub async fn me(&self) -> Result<User> {
        self.client.get("/users/me").await
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<User> {
        self.client.put("/users/me", update).await
    }

    pub async fn update_role(&self, id: &str, role: Role) -> Result<User> {
        let path = format!("{}/role", resource_path("/users", id)?);
        self.client.put(&path, &RoleChange { role }).await
    }

    /// Activate or deactivate an account
    pub async fn set_active(&self, id: &str, active: bool) -> Result<User> {
        let path = format!("{}/status", resource_path("/users", id)?);
        self.client.put(&path, &StatusChange { active }).await
    }
}
