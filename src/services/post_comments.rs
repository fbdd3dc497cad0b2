//! Comments on community posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comments::validate_content;
use super::{resource_path, AuthorSummary};
use crate::client::{ApiClient, ApiRequest, Page, PageRequest};
use crate::comments::{CommentTree, ThreadItem};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostComment {
    pub id: String,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
}

impl ThreadItem for PostComment {
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
struct NewPostComment<'a> {
    post_id: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

pub struct PostCommentService<'a> {
    client: &'a ApiClient,
}

impl<'a> PostCommentService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Every comment on a post, replies included, as a flat list
    pub async fn list_for_post(&self, post_id: &str, page: PageRequest) -> Result<Page<Vec<PostComment>>> {
        let request = ApiRequest::get(resource_path("/post-comments/post", post_id)?).queries(page.to_query());
        self.client.fetch_page(request).await
    }

    pub async fn create(&self, post_id: &str, content: &str) -> Result<PostComment> {
        let body = NewPostComment {
            post_id,
            content: validate_content(content)?,
            parent_id: None,
        };
        self.client.post("/post-comments", &body).await
    }

    pub async fn reply(&self, post_id: &str, parent_id: &str, content: &str) -> Result<PostComment> {
        let body = NewPostComment {
            post_id,
            content: validate_content(content)?,
            parent_id: Some(parent_id),
        };
        self.client.post("/post-comments", &body).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/post-comments", id)?).await
    }

    /// Fetch a page of the flat list and assemble it into a tree
    pub async fn thread(&self, post_id: &str, page: PageRequest) -> Result<CommentTree<PostComment>> {
        let page = self.list_for_post(post_id, page).await?;
        Ok(CommentTree::from_items(page.items))
    }
}
