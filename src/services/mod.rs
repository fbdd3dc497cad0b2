//! Thin wrappers over the portal's REST resources

pub mod badges;
pub mod categories;
pub mod comments;
pub mod post_comments;
pub mod posts;
pub mod ratings;
pub mod uploads;
pub mod users;
pub mod videos;

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{Error, Result};

pub use badges::BadgeService;
pub use categories::CategoryService;
pub use comments::CommentService;
pub use post_comments::PostCommentService;
pub use posts::PostService;
pub use ratings::RatingService;
pub use uploads::UploadService;
pub use users::UserService;
pub use videos::VideoService;

/// Author details embedded in videos, posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// `{base}/{id}`, rejecting ids that would escape the resource path
pub(crate) fn resource_path(base: &str, id: &str) -> Result<String> {
    let id = id.trim();
    if id.is_empty() || id.contains('/') || id.contains('?') || id.contains('#') {
        return Err(Error::InvalidInput(format!("invalid resource id '{}'", id)));
    }
    Ok(format!("{}/{}", base, id))
}

impl ApiClient {
    pub fn videos(&self) -> VideoService<'_> {
        VideoService::new(self)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(self)
    }

    pub fn posts(&self) -> PostService<'_> {
        PostService::new(self)
    }

    pub fn post_comments(&self) -> PostCommentService<'_> {
        PostCommentService::new(self)
    }

    pub fn uploads(&self) -> UploadService<'_> {
        UploadService::new(self)
    }

    pub fn ratings(&self) -> RatingService<'_> {
        RatingService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }

    pub fn badges(&self) -> BadgeService<'_> {
        BadgeService::new(self)
    }

    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService::new(self)
    }
}
