use crate::error::MeetupError;
use crate::models::{Meeting, MeetupResponse, ResponseStatus};

/// Accepted participants needed for a meetup to count as happening
pub const QUORUM: usize = 2;

/// Status change applied to one meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: ResponseStatus,
    pub current: ResponseStatus,
    pub accepted_before: usize,
    pub accepted_after: usize,
    /// Adjustment owed to the community's `accepted_meetups`
    pub counter_delta: i64,
}

impl From<MeetupResponse> for ResponseStatus {
    fn from(value: MeetupResponse) -> Self {
        match value {
            MeetupResponse::Accept => ResponseStatus::Accepted,
            MeetupResponse::Decline => ResponseStatus::Declined,
        }
    }
}

/// Record `member`'s response on the meeting.
///
/// Rejected with `MemberNotInMeeting` before anything changes when the
/// member is not a participant.
pub fn apply_response(
    meeting: &mut Meeting,
    member: &str,
    response: MeetupResponse,
) -> Result<Transition, MeetupError> {
    let accepted_before = meeting.accepted_count();

    let entry = meeting
        .user_list
        .get_mut(member)
        .ok_or_else(|| MeetupError::MemberNotInMeeting {
            meeting: meeting.id.clone(),
            member: member.to_string(),
        })?;

    let previous = *entry;
    let current = ResponseStatus::from(response);
    *entry = current;

    let accepted_after = meeting.accepted_count();

    Ok(Transition {
        previous,
        current,
        accepted_before,
        accepted_after,
        counter_delta: quorum_delta(accepted_before, accepted_after),
    })
}

/// Counter adjustment for a change in accepted participants.
///
/// Reaching quorum and losing it both decrement `accepted_meetups`. The
/// reach-quorum sign is what the stored counters were built with and stays
/// until product confirms the intended direction.
pub fn quorum_delta(accepted_before: usize, accepted_after: usize) -> i64 {
    let reached = accepted_before < QUORUM && accepted_after == QUORUM;
    let lost = accepted_before >= QUORUM && accepted_after < QUORUM;

    if reached || lost {
        -1
    } else {
        0
    }
}
