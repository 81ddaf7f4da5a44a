use thiserror::Error;

use crate::services::StoreError;

/// Errors surfaced by the meetup engine
#[derive(Debug, Error)]
pub enum MeetupError {
    #[error("Not enough users in this community: {found}. Need at least {required}.")]
    InsufficientParticipants { found: usize, required: usize },

    #[error("Meeting id already taken: {0}")]
    DuplicateMeetingId(String),

    #[error("Failed to update counters for community {community}: {source}")]
    CounterUpdateFailure {
        community: String,
        #[source]
        source: StoreError,
    },

    #[error("{member} was not in meeting {meeting}")]
    MemberNotInMeeting { meeting: String, member: String },

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("Community not found: {0}")]
    CommunityNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl MeetupError {
    /// Whether the failure should abort the action.
    ///
    /// Duplicate ids and counter writes are logged and the action carries on
    /// with whatever was already persisted.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MeetupError::DuplicateMeetingId(_) | MeetupError::CounterUpdateFailure { .. }
        )
    }
}

impl From<validator::ValidationErrors> for MeetupError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MeetupError::InvalidRequest(errors.to_string())
    }
}
