//! Multipart media uploads

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::resource_path;
use crate::client::{ApiClient, FormField};
use crate::error::{Error, Result};

/// Where the server stored an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    fn field(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Video => "/uploads/video",
            MediaKind::Image => "/uploads/image",
        }
    }
}

/// Guess a mime type from the file extension
pub fn mime_for(path: &Path, kind: MediaKind) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mime = match (kind, ext.as_str()) {
        (MediaKind::Video, "mp4") => "video/mp4",
        (MediaKind::Video, "webm") => "video/webm",
        (MediaKind::Video, "mov") => "video/quicktime",
        (MediaKind::Video, "mkv") => "video/x-matroska",
        (MediaKind::Video, "avi") => "video/x-msvideo",
        (MediaKind::Image, "png") => "image/png",
        (MediaKind::Image, "jpg" | "jpeg") => "image/jpeg",
        (MediaKind::Image, "gif") => "image/gif",
        (MediaKind::Image, "webp") => "image/webp",
        _ => {
            return Err(Error::InvalidInput(format!(
                "unsupported {} file '{}'",
                kind.field(),
                path.display()
            )))
        }
    };
    Ok(mime)
}

pub struct UploadService<'a> {
    client: &'a ApiClient,
}

impl<'a> UploadService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn upload_video(&self, path: &Path) -> Result<UploadedFile> {
        self.upload(MediaKind::Video, path).await
    }

    pub async fn upload_image(&self, path: &Path) -> Result<UploadedFile> {
        self.upload(MediaKind::Image, path).await
    }

    /// Upload in-memory bytes
    pub async fn upload_bytes(
        &self,
        kind: MediaKind,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile> {
        let field = FormField::File {
            name: kind.field().to_string(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes,
        };
        self.client.upload(kind.endpoint(), vec![field]).await
    }

    pub async fn delete(&self, filename: &str) -> Result<()> {
        self.client.delete(&resource_path("/uploads", filename)?).await
    }

    async fn upload(&self, kind: MediaKind, path: &Path) -> Result<UploadedFile> {
        let mime = mime_for(path, kind)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("invalid file name '{}'", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        info!("Uploading {} ({} bytes)", file_name, bytes.len());
        self.upload_bytes(kind, &file_name, mime, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for(Path::new("clase.MP4"), MediaKind::Video).unwrap(), "video/mp4");
        assert_eq!(mime_for(Path::new("a/b/avatar.jpeg"), MediaKind::Image).unwrap(), "image/jpeg");
    }

    #[test]
    fn test_mime_for_rejects_mismatch() {
        assert!(mime_for(Path::new("avatar.png"), MediaKind::Video).is_err());
        assert!(mime_for(Path::new("notes"), MediaKind::Image).is_err());
    }
}
