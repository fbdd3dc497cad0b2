//! Community posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{resource_path, AuthorSummary};
use crate::client::{ApiClient, ApiRequest, Page, PageRequest};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by_me: bool,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("post title cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput("post content cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Result of toggling a like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    pub likes: u64,
}

pub struct PostService<'a> {
    client: &'a ApiClient,
}

impl<'a> PostService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: PageRequest, search: Option<&str>) -> Result<Page<Vec<Post>>> {
        let request = ApiRequest::get("/posts")
            .queries(page.to_query())
            .query_opt("search", search.filter(|s| !s.trim().is_empty()));
        self.client.fetch_page(request).await
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        self.client.get(&resource_path("/posts", id)?).await
    }

    pub async fn create(&self, post: &NewPost) -> Result<Post> {
        post.validate()?;
        self.client.post("/posts", post).await
    }

    pub async fn update(&self, id: &str, update: &PostUpdate) -> Result<Post> {
        self.client.put(&resource_path("/posts", id)?, update).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/posts", id)?).await
    }

    /// Toggle the current user's like on a post
    pub async fn like(&self, id: &str) -> Result<LikeStatus> {
        let path = format!("{}/like", resource_path("/posts", id)?);
        self.client.post(&path, &serde_json::json!({})).await
    }
}
