//! Video ratings

use serde::{Deserialize, Serialize};

use super::resource_path;
use crate::client::ApiClient;
use crate::error::{Error, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    #[serde(default)]
    pub id: Option<String>,
    pub video_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub rating: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    #[serde(default)]
    pub average: f32,
    #[serde(default)]
    pub count: u64,
}

pub fn validate_rating(value: u8) -> Result<u8> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(Error::InvalidInput(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(value)
}

pub struct RatingService<'a> {
    client: &'a ApiClient,
}

impl<'a> RatingService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Create or replace the current user's rating
    pub async fn rate(&self, video_id: &str, value: u8) -> Result<Rating> {
        let value = validate_rating(value)?;
        let path = format!("{}/ratings", resource_path("/videos", video_id)?);
        self.client
            .post(&path, &serde_json::json!({ "rating": value }))
            .await
    }

    /// The current user's rating, if they have rated the video
    pub async fn my_rating(&self, video_id: &str) -> Result<Option<Rating>> {
        let path = format!("{}/ratings/me", resource_path("/videos", video_id)?);
        match self.client.get(&path).await {
            Err(Error::Api(err)) if err.status == Some(404) => Ok(None),
            other => other,
        }
    }

    pub async fn summary(&self, video_id: &str) -> Result<RatingSummary> {
        let path = format!("{}/ratings", resource_path("/videos", video_id)?);
        self.client.get(&path).await
    }
}
