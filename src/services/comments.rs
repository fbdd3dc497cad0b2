//! Video comments and their replies

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{resource_path, AuthorSummary};
use crate::client::{ApiClient, ApiRequest, Page, PageRequest};
use crate::comments::{CommentTree, ThreadItem};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ThreadItem for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
    video_id: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

pub(crate) fn validate_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("comment cannot be empty".to_string()));
    }
    Ok(trimmed)
}

pub struct CommentService<'a> {
    client: &'a ApiClient,
}

impl<'a> CommentService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Top-level comments on a video
    pub async fn list_for_video(&self, video_id: &str, page: PageRequest) -> Result<Page<Vec<Comment>>> {
        let request = ApiRequest::get(resource_path("/comments/video", video_id)?).queries(page.to_query());
        self.client.fetch_page(request).await
    }

    pub async fn replies(&self, comment_id: &str, page: PageRequest) -> Result<Page<Vec<Comment>>> {
        let path = format!("{}/replies", resource_path("/comments", comment_id)?);
        self.client
            .fetch_page(ApiRequest::get(path).queries(page.to_query()))
            .await
    }

    pub async fn create(&self, video_id: &str, content: &str) -> Result<Comment> {
        let body = NewComment {
            video_id,
            content: validate_content(content)?,
            parent_id: None,
        };
        self.client.post("/comments", &body).await
    }

    pub async fn reply(&self, video_id: &str, parent_id: &str, content: &str) -> Result<Comment> {
        let body = NewComment {
            video_id,
            content: validate_content(content)?,
            parent_id: Some(parent_id),
        };
        self.client.post("/comments", &body).await
    }

    pub async fn update(&self, id: &str, content: &str) -> Result<Comment> {
        let body = serde_json::json!({ "content": validate_content(content)? });
        self.client.put(&resource_path("/comments", id)?, &body).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/comments", id)?).await
    }

    /// Fetch one page of top-level comments and the first page of replies
    /// beneath them, `max_depth` levels deep, into a tree. Replies at the same
    /// level are fetched concurrently.
    pub async fn load_thread(
        &self,
        video_id: &str,
        page: PageRequest,
        replies_per_comment: u32,
        max_depth: usize,
    ) -> Result<(CommentTree<Comment>, Page<Vec<Comment>>)> {
        let roots = self.list_for_video(video_id, page).await?;
        let mut tree = CommentTree::from_items(roots.items.iter().cloned());

        let mut frontier: Vec<String> = roots
            .items
            .iter()
            .filter(|c| c.replies_count > 0)
            .map(|c| c.id.clone())
            .collect();

        let reply_page = PageRequest::new(1, replies_per_comment);
        for depth in 0..max_depth {
            if frontier.is_empty() {
                break;
            }
            debug!("Loading replies for {} comment(s) at depth {}", frontier.len(), depth + 1);

            let pages = try_join_all(frontier.iter().map(|id| self.replies(id, reply_page))).await?;

            let parents = std::mem::take(&mut frontier);
            for (parent, page) in parents.into_iter().zip(pages) {
                for mut reply in page.items {
                    // Some endpoints omit parentId on replies
                    if reply.parent_id.is_none() {
                        reply.parent_id = Some(parent.clone());
                    }
                    let id = reply.id.clone();
                    let nested = reply.replies_count > 0;
                    if tree.insert(reply) && nested {
                        frontier.push(id);
                    }
                }
            }
        }

        Ok((tree, roots))
    }
}
