//! Response envelope shared by every portal endpoint

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// `{ success, data, message, errorCode, pagination }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Only an explicit `false` marks a 2xx body as failed
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub pagination: Option<Pagination>,
}

fn default_success() -> bool {
    true
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Take the payload. Endpoints that answer without `data` still decode into
    /// `()`, `Option<_>` or `serde_json::Value`.
    pub fn into_data(self, status: StatusCode) -> Result<T> {
        match self.data {
            Some(data) => Ok(data),
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| ApiError::invalid_response(status, "missing data").into()),
        }
    }

    pub fn into_page(self, status: StatusCode) -> Result<Page<T>> {
        let pagination = self.pagination;
        let items = self.into_data(status)?;
        Ok(Page { items, pagination })
    }
}

/// Paging metadata returned alongside list payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// A page of results. `pagination` is absent when the server returned a bare list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: T,
    pub pagination: Option<Pagination>,
}

impl<T> Page<Vec<T>> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.pagination.is_some_and(|p| p.has_next())
    }
}

/// Page/limit query shared by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn to_query(self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}
