//! Achievement badges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource_path;
use crate::client::ApiClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Set when the badge is listed for a particular user
    #[serde(default)]
    pub awarded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBadge {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Award<'a> {
    user_id: &'a str,
}

pub struct BadgeService<'a> {
    client: &'a ApiClient,
}

impl<'a> BadgeService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Badge>> {
        self.client.get("/badges").await
    }

    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Badge>> {
        self.client.get(&resource_path("/badges/user", user_id)?).await
    }

    pub async fn create(&self, badge: &NewBadge) -> Result<Badge> {
        if badge.name.trim().is_empty() {
            return Err(Error::InvalidInput("badge name cannot be empty".to_string()));
        }
        self.client.post("/badges", badge).await
    }

    pub async fn award(&self, badge_id: &str, user_id: &str) -> Result<()> {
        let path = format!("{}/award", resource_path("/badges", badge_id)?);
        self.client.post(&path, &Award { user_id }).await
    }
}
