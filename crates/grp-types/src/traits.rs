//! Traits for the external collaborators and the event processor.

use crate::{AccessToken, Membership, MembershipOutcome, Operation, SyncResponse};
use async_trait::async_trait;

/// Source of trusted identity-provider CIDR ranges.
#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Fetch the current ranges, flattened in document order. Rebuilt on every call.
    async fn fetch_ranges(&self) -> Result<Vec<String>, RangeFetchError>;
}

/// Scoped OAuth token provider.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, TokenError>;
}

/// Group directory (subset of the Cloud Identity groups API).
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Resolve a group's stable key (usually its email) to its resource name.
    async fn lookup_group_name(
        &self,
        token: &AccessToken,
        group_key_id: &str,
    ) -> Result<String, DirectoryError>;

    /// Create a membership under `group_name` (e.g. `groups/01abc`).
    async fn create_membership(
        &self,
        token: &AccessToken,
        group_name: &str,
        membership: &Membership,
    ) -> Result<Operation, DirectoryError>;
}

/// Adds a principal to the configured parent group.
#[async_trait]
pub trait Propagator: Send + Sync {
    async fn propagate(&self, membership_id: &str) -> Result<MembershipOutcome, PropagationError>;
}

/// Handles one inbound event body and produces the dispatcher response. Never fails.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, body: &[u8]) -> SyncResponse;
}

#[derive(Debug, thiserror::Error)]
pub enum RangeFetchError {
    #[error("range fetch http error: {0}")]
    Http(String),
    #[error("range fetch returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("range document parse error: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token http error: {0}")]
    Http(String),
    #[error("token endpoint returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("token parse error: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory http error: {0}")]
    Http(String),
    #[error("directory API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("directory response parse error: {0}")]
    Parse(String),
    #[error("directory response missing field: {0}")]
    MissingField(&'static str),
    #[error("directory operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("credentials: {0}")]
    Token(#[from] TokenError),
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid push envelope: {0}")]
    Envelope(String),
    #[error("push message has no data")]
    MissingData,
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("invalid utf-8: {0}")]
    Utf8(String),
    #[error("invalid audit log json: {0}")]
    Json(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}
