//! Video catalogue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{resource_path, AuthorSummary};
use crate::client::{ApiClient, ApiRequest, Page, PageRequest};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub page: PageRequest,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub struct VideoService<'a> {
    client: &'a ApiClient,
}

impl<'a> VideoService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &VideoFilter) -> Result<Page<Vec<Video>>> {
        let request = ApiRequest::get("/videos")
            .queries(filter.page.to_query())
            .query_opt("category", filter.category.as_deref())
            .query_opt("search", filter.search.as_deref().filter(|s| !s.trim().is_empty()));
        self.client.fetch_page(request).await
    }

    pub async fn get(&self, id: &str) -> Result<Video> {
        self.client.get(&resource_path("/videos", id)?).await
    }

    pub async fn create(&self, video: &NewVideo) -> Result<Video> {
        self.client.post("/videos", video).await
    }

    pub async fn update(&self, id: &str, update: &VideoUpdate) -> Result<Video> {
        self.client.put(&resource_path("/videos", id)?, update).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/videos", id)?).await
    }

    /// Count a view; returns the new total
    pub async fn register_view(&self, id: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct Views {
            views: u64,
        }
        let path = format!("{}/view", resource_path("/videos", id)?);
        let views: Views = self.client.post(&path, &serde_json::json!({})).await?;
        Ok(views.views)
    }
}
