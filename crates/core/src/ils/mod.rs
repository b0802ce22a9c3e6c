//! ILS web-services access.
//!
//! This module provides the `IlsApi` trait covering the logical operations the
//! pull-list workflow needs (login, pull list, hold record, item, bib, call and
//! patron lookups) and `IlswsClient`, its implementation for SirsiDynix
//! Symphony Web Services over JSON/HTTPS.
//!
//! Implementations perform exactly one HTTP exchange per call. Concurrency
//! limiting and retries are applied on top by [`crate::gate::RequestGate`].

mod client;
mod types;

pub use client::IlswsClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Session;
use crate::config::PullListMode;

/// Errors that can occur when talking to the ILS.
#[derive(Debug, Error)]
pub enum IlsError {
    /// Request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Could not connect to the server.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials were rejected.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// A record lacked a field the workflow depends on.
    #[error("{resource} '{key}' is missing {field}")]
    MissingField {
        resource: &'static str,
        key: String,
        field: &'static str,
    },

    /// A field carried a value the workflow cannot use.
    #[error("{resource} '{key}' has unexpected {field} '{value}'")]
    UnexpectedValue {
        resource: &'static str,
        key: String,
        field: &'static str,
        value: String,
    },

    /// The request gate was shut down.
    #[error("Request gate closed")]
    GateClosed,
}

impl IlsError {
    /// Creates a missing field error.
    pub fn missing_field(resource: &'static str, key: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            resource,
            key: key.into(),
            field,
        }
    }
}

/// Logical ILS operations used by the pull-list workflow.
///
/// Keys are opaque identifiers returned by earlier calls.
#[async_trait]
pub trait IlsApi: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Exchanges credentials for a session token.
    async fn login(&self, username: &str, password: &str) -> Result<String, IlsError>;

    /// Fetches the hold pull list of one library.
    async fn hold_item_pull_list(
        &self,
        session: &Session,
        branch_key: &str,
        mode: PullListMode,
    ) -> Result<Record<PullListFields>, IlsError>;

    /// Fetches a hold record.
    async fn hold_record(
        &self,
        session: &Session,
        key: &str,
    ) -> Result<Record<HoldRecordFields>, IlsError>;

    /// Fetches an item (physical copy).
    async fn item(&self, session: &Session, key: &str) -> Result<Record<ItemFields>, IlsError>;

    /// Fetches a bibliographic record.
    async fn bib(&self, session: &Session, key: &str) -> Result<Record<BibFields>, IlsError>;

    /// Fetches a call number record.
    async fn call(&self, session: &Session, key: &str) -> Result<Record<CallFields>, IlsError>;

    /// Fetches a patron.
    async fn patron(&self, session: &Session, key: &str)
        -> Result<Record<PatronFields>, IlsError>;
}
