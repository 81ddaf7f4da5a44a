use chrono::Utc;
use validator::Validate;

use crate::core::{find_meeting_time, next_occurrence, to_weekly_intervals};
use crate::engine::Engine;
use crate::error::MeetupError;
use crate::models::{Meeting, MeetingProposal, Member, RescheduleRequest, ResolveTimeRequest};

/// Earliest common window over the members' stored schedules.
///
/// Members are intersected in the order given. `None` when any member has no
/// usable availability or the schedules never overlap for long enough.
pub fn propose(members: &[&Member], meeting_length: Option<u32>) -> Option<MeetingProposal> {
    let availability: Vec<_> = members
        .iter()
        .map(|m| to_weekly_intervals(&m.schedule))
        .collect();

    find_meeting_time(&availability, meeting_length).map(|interval| MeetingProposal {
        interval,
        participants: members.iter().map(|m| m.id.clone()).collect(),
    })
}

/// Stamp a proposal onto a meeting as its next weekly occurrence
pub(crate) fn apply_proposal(meeting: &mut Meeting, proposal: &MeetingProposal) {
    meeting.timestamp = Some(next_occurrence(proposal.interval.start, Utc::now()));
    meeting.duration = proposal.interval.len();
}

impl Engine {
    /// Meeting length to ask for: explicit, else the longest any member
    /// requested, else the configured default
    pub(crate) fn meeting_length_for(&self, members: &[&Member], requested: Option<u32>) -> Option<u32> {
        requested
            .or_else(|| members.iter().filter_map(|m| m.meet_length).max())
            .or(self.options.default_meeting_length)
    }

    /// Resolve the earliest window the listed members share
    pub async fn resolve_time(
        &self,
        req: &ResolveTimeRequest,
    ) -> Result<Option<MeetingProposal>, MeetupError> {
        req.validate()?;

        let members = self
            .load_members(req.participants.iter().map(String::as_str))
            .await?;
        let refs: Vec<&Member> = members.iter().collect();

        let proposal = propose(&refs, req.meeting_length);

        match &proposal {
            Some(p) => tracing::info!(
                "Resolved window {} for {} participants",
                p.interval,
                p.participants.len()
            ),
            None => tracing::info!(
                "No common window for {:?} (length: {:?})",
                req.participants,
                req.meeting_length
            ),
        }

        Ok(proposal)
    }

    /// Pick a new window for an existing meeting from its participants'
    /// schedules. The meeting is left untouched when none exists.
    pub async fn reschedule(
        &self,
        req: &RescheduleRequest,
    ) -> Result<Option<MeetingProposal>, MeetupError> {
        req.validate()?;
        let _guard = self.locks.meeting(&req.meeting_id).await;

        let mut meeting = self
            .store
            .get_meeting(&req.meeting_id)
            .await?
            .ok_or_else(|| MeetupError::MeetingNotFound(req.meeting_id.clone()))?;

        let members = self.load_members(meeting.participants()).await?;
        let refs: Vec<&Member> = members.iter().collect();
        let length = self.meeting_length_for(&refs, req.meeting_length);

        let Some(proposal) = propose(&refs, length) else {
            tracing::info!("No common window to reschedule meeting {}", meeting.id);
            return Ok(None);
        };

        apply_proposal(&mut meeting, &proposal);
        self.store.update_meeting(&meeting).await?;

        tracing::info!(
            "Rescheduled meeting {} to slot {} ({}h)",
            meeting.id,
            proposal.interval.start,
            meeting.duration
        );
        Ok(Some(proposal))
    }
}
