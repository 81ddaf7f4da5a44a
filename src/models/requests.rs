use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to run one matchup round over a community
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchupRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "communityId")]
    pub community_id: String,
}

/// Request to resolve a common meeting window
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveTimeRequest {
    #[validate(length(min = 2))]
    pub participants: Vec<String>,
    #[validate(range(min = 1, max = 168))]
    #[serde(rename = "meetingLength", default)]
    pub meeting_length: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetupResponse {
    Accept,
    Decline,
}

/// Request to record a participant accepting or declining a meetup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RespondRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    #[validate(length(min = 1))]
    #[serde(rename = "memberId")]
    pub member_id: String,
    pub response: MeetupResponse,
}

/// Request to set up a fresh meetup between two members of a community
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReconnectRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "communityId")]
    pub community_id: String,
    #[validate(length(min = 1))]
    pub requester: String,
    #[validate(length(min = 1))]
    pub other: String,
}

/// Request to settle a meetup's venue from a list of proposals
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetVenueRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    #[validate(length(min = 1))]
    pub venues: Vec<String>,
}

/// Request to pick a new window for an existing meetup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    #[validate(range(min = 1, max = 168))]
    #[serde(rename = "meetingLength", default)]
    pub meeting_length: Option<u32>,
}
