//! Aula - client core for the Aula education portal
//!
//! This is the library interface: an authenticated HTTP client with
//! single-flight token refresh, session management with role checks and
//! route guards, typed wrappers for the portal's REST resources, and a
//! threaded comment tree.

pub mod auth;
pub mod cli;
pub mod client;
pub mod comments;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod theme;

pub use auth::AuthManager;
pub use client::ApiClient;
pub use config::Config;
pub use error::Error;
