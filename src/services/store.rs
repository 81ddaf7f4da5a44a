use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Community, CommunityCounters, Meeting, Member, Rating};

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document id already exists: {0}")]
    Conflict(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Narrow read/update surface of the managed document store.
///
/// Lookups return `Ok(None)` for a missing document. Updates are partial
/// merges of the named fields, never full overwrites.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, StoreError>;

    async fn get_community(&self, community_id: &str) -> Result<Option<Community>, StoreError>;

    /// Overwrite the three aggregate counter fields on a community
    async fn update_community_counters(
        &self,
        community_id: &str,
        counters: &CommunityCounters,
    ) -> Result<(), StoreError>;

    /// Create a meeting; fails with `Conflict` when the id is taken
    async fn create_meeting(&self, meeting: &Meeting) -> Result<(), StoreError>;

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, StoreError>;

    /// Write back the mutable meeting fields: statuses, time, venue
    async fn update_meeting(&self, meeting: &Meeting) -> Result<(), StoreError>;

    async fn create_rating(&self, rating: &Rating) -> Result<(), StoreError>;
}
