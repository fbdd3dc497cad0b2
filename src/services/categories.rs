//! Video categories

use serde::{Deserialize, Serialize};

use super::resource_path;
use crate::client::ApiClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("category name cannot be empty".to_string()));
        }
        Ok(())
    }
}

pub struct CategoryService<'a> {
    client: &'a ApiClient,
}

impl<'a> CategoryService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        self.client.get("/categories").await
    }

    pub async fn create(&self, input: &CategoryInput) -> Result<Category> {
        input.validate()?;
        self.client.post("/categories", input).await
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> Result<Category> {
        input.validate()?;
        self.client.put(&resource_path("/categories", id)?, input).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&resource_path("/categories", id)?).await
    }
}
