//! "Load more" bookkeeping for paginated replies

use std::collections::HashMap;

use crate::client::{Page, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CursorState {
    loaded_page: u32,
    has_more: bool,
}

/// Tracks, per parent comment, which page of replies was fetched last and
/// whether the server has more.
#[derive(Debug, Clone)]
pub struct ReplyCursor {
    limit: u32,
    states: HashMap<String, CursorState>,
}

impl ReplyCursor {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            states: HashMap::new(),
        }
    }

    /// The request to issue for the next batch of replies to `parent`, or
    /// `None` once everything has been loaded.
    pub fn next_request(&self, parent: &str) -> Option<PageRequest> {
        match self.states.get(parent) {
            None => Some(PageRequest::new(1, self.limit)),
            Some(state) if state.has_more => {
                Some(PageRequest::new(state.loaded_page + 1, self.limit))
            }
            Some(_) => None,
        }
    }

    /// Record a page of replies fetched for `parent`
    pub fn record<T>(&mut self, parent: &str, request: PageRequest, page: &Page<Vec<T>>) {
        let has_more = match page.pagination {
            Some(p) => p.has_next(),
            // Without metadata a full page suggests there may be more
            None => page.len() as u32 >= request.limit,
        };
        self.states.insert(
            parent.to_string(),
            CursorState {
                loaded_page: request.page,
                has_more,
            },
        );
    }

    pub fn has_more(&self, parent: &str) -> bool {
        self.next_request(parent).is_some()
    }

    pub fn reset(&mut self, parent: &str) {
        self.states.remove(parent);
    }
}

impl Default for ReplyCursor {
    fn default() -> Self {
        Self::new(PageRequest::default().limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Pagination;

    fn page(n: usize, pagination: Option<Pagination>) -> Page<Vec<u8>> {
        Page {
            items: vec![0; n],
            pagination,
        }
    }

    #[test]
    fn test_first_request_is_page_one() {
        let cursor = ReplyCursor::new(5);
        assert_eq!(cursor.next_request("c1"), Some(PageRequest::new(1, 5)));
    }

    #[test]
    fn test_follows_server_pagination() {
        let mut cursor = ReplyCursor::new(5);
        let first = cursor.next_request("c1").unwrap();
        cursor.record(
            "c1",
            first,
            &page(
                5,
                Some(Pagination {
                    page: 1,
                    limit: 5,
                    total: 7,
                    total_pages: 2,
                }),
            ),
        );
        let second = cursor.next_request("c1").unwrap();
        assert_eq!(second.page, 2);

        cursor.record(
            "c1",
            second,
            &page(
                2,
                Some(Pagination {
                    page: 2,
                    limit: 5,
                    total: 7,
                    total_pages: 2,
                }),
            ),
        );
        assert!(!cursor.has_more("c1"));
    }

    #[test]
    fn test_short_page_without_metadata_ends() {
        let mut cursor = ReplyCursor::new(5);
        let req = cursor.next_request("c1").unwrap();
        cursor.record("c1", req, &page(3, None));
        assert!(!cursor.has_more("c1"));

        cursor.reset("c1");
        assert!(cursor.has_more("c1"));
    }
}
