use serde::{Deserialize, Serialize};
use crate::models::domain::{LeftoverGroup, Meeting, Pair};

/// A meetup the matchup round computed but could not persist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedMeetup {
    pub members: Vec<String>,
    pub meeting_id: String,
    pub reason: String,
}

/// Result of one matchup round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupReport {
    pub community: String,
    pub pairs: Vec<Pair>,
    pub leftover: Option<LeftoverGroup>,
    pub created: Vec<Meeting>,
    pub skipped: Vec<SkippedMeetup>,
    #[serde(rename = "countersUpdated")]
    pub counters_updated: bool,
}

/// Result of an accept or decline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseOutcome {
    pub meeting: Meeting,
    #[serde(rename = "acceptedBefore")]
    pub accepted_before: usize,
    #[serde(rename = "acceptedAfter")]
    pub accepted_after: usize,
    #[serde(rename = "counterDelta")]
    pub counter_delta: i64,
    #[serde(rename = "countersUpdated")]
    pub counters_updated: bool,
}
