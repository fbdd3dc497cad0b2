//! HTTP access to the portal API

pub mod envelope;
pub mod events;
mod http;
pub mod refresh;
pub mod request;

pub use envelope::{Envelope, Page, PageRequest, Pagination};
pub use events::{ClearReason, SessionEvent};
pub use http::ApiClient;
pub use refresh::RefreshCoordinator;
pub use request::{ApiRequest, FormField, RequestBody};
