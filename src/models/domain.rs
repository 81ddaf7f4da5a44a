use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::availability::SlotInterval;

/// Community member account with the attributes the matcher compares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "email")]
    pub id: String,
    #[serde(rename = "optIn", default, deserialize_with = "deserialize_opt_in")]
    pub opt_in: bool,
    #[serde(default)]
    pub covid: Option<String>,
    #[serde(rename = "meetType", default)]
    pub meet_type: Option<String>,
    #[serde(rename = "meetGroup", default)]
    pub meet_group: Option<String>,
    #[serde(rename = "meetLength", default)]
    pub meet_length: Option<u32>,
    /// Raw availability as submitted: POSIX-second (start, end) pairs
    #[serde(default)]
    pub schedule: Vec<(i64, i64)>,
}

impl Member {
    /// Helper for building a member in tests and fixtures
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opt_in: true,
            covid: None,
            meet_type: None,
            meet_group: None,
            meet_length: None,
            schedule: Vec::new(),
        }
    }

    pub fn with_covid(mut self, covid: &str) -> Self {
        self.covid = Some(covid.to_string());
        self
    }

    pub fn with_meet_type(mut self, meet_type: &str) -> Self {
        self.meet_type = Some(meet_type.to_string());
        self
    }

    pub fn opted_out(mut self) -> Self {
        self.opt_in = false;
        self
    }

    /// Whether the member's meet-type preference names a remote format
    pub fn prefers_virtual(&self) -> bool {
        matches!(
            self.meet_type.as_deref().map(str::to_lowercase).as_deref(),
            Some("zoom") | Some("virtual") | Some("online")
        )
    }
}

/// The store keeps `optIn` as either 0/1 or a boolean depending on the writer
fn deserialize_opt_in<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

/// Aggregate meetup counters kept on the community document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCounters {
    #[serde(default)]
    pub total_meetups: i64,
    #[serde(default)]
    pub total_sessions: i64,
    /// A meetup where at least two participants accepted
    #[serde(default)]
    pub accepted_meetups: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "Admins", default)]
    pub admins: Vec<String>,
    #[serde(rename = "Members", default)]
    pub members: Vec<String>,
    #[serde(flatten)]
    pub counters: CommunityCounters,
}

impl Community {
    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m == member_id)
    }
}

/// A participant's response to a meetup invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum ResponseStatus {
    Pending,
    Accepted,
    Declined,
}

impl From<ResponseStatus> for i8 {
    fn from(value: ResponseStatus) -> Self {
        match value {
            ResponseStatus::Pending => 0,
            ResponseStatus::Accepted => 1,
            ResponseStatus::Declined => -1,
        }
    }
}

impl TryFrom<i8> for ResponseStatus {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResponseStatus::Pending),
            1 => Ok(ResponseStatus::Accepted),
            -1 => Ok(ResponseStatus::Declined),
            other => Err(format!("unknown response status code {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MeetingType {
    InPerson,
    Virtual,
}

impl From<MeetingType> for u8 {
    fn from(value: MeetingType) -> Self {
        match value {
            MeetingType::InPerson => 0,
            MeetingType::Virtual => 1,
        }
    }
}

impl TryFrom<u8> for MeetingType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MeetingType::InPerson),
            1 => Ok(MeetingType::Virtual),
            other => Err(format!("unknown meeting type code {}", other)),
        }
    }
}

impl MeetingType {
    /// Virtual only when every participant asked for a remote format
    pub fn for_participants(members: &[&Member]) -> Self {
        if !members.is_empty() && members.iter().all(|m| m.prefers_virtual()) {
            MeetingType::Virtual
        } else {
            MeetingType::InPerson
        }
    }
}

/// Persisted meetup record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub user_list: BTreeMap<String, ResponseStatus>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    /// Length in hours
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "meettype")]
    pub meeting_type: MeetingType,
    pub community: String,
}

impl Meeting {
    /// New meetup with every participant pending
    pub fn new<I, S>(id: String, community: &str, participants: I, meeting_type: MeetingType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            user_list: participants
                .into_iter()
                .map(|p| (p.into(), ResponseStatus::Pending))
                .collect(),
            timestamp: None,
            duration: 0,
            location: None,
            meeting_type,
            community: community.to_string(),
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.user_list.keys().map(String::as_str)
    }

    pub fn accepted_count(&self) -> usize {
        self.user_list
            .values()
            .filter(|s| **s == ResponseStatus::Accepted)
            .count()
    }
}

/// Rating stub created alongside every generated meetup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub meeting_id: String,
    pub rating_dict: BTreeMap<String, Option<u8>>,
    pub community: String,
}

impl Rating {
    pub fn stub_for(meeting: &Meeting) -> Self {
        Self {
            meeting_id: meeting.id.clone(),
            rating_dict: meeting.participants().map(|p| (p.to_string(), None)).collect(),
            community: meeting.community.clone(),
        }
    }
}

/// Two members selected to meet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair(pub String, pub String);

impl Pair {
    pub fn members(&self) -> [&str; 2] {
        [&self.0, &self.1]
    }

    pub fn contains(&self, member_id: &str) -> bool {
        self.0 == member_id || self.1 == member_id
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.0, self.1)
    }
}

/// Members stranded with no eligible neighbor, met as one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftoverGroup {
    pub members: Vec<String>,
}

/// Resolved common window and whose availability produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingProposal {
    pub interval: SlotInterval,
    pub participants: Vec<String>,
}
