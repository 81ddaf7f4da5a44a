use validator::Validate;

use crate::core::lifecycle;
use crate::engine::Engine;
use crate::error::MeetupError;
use crate::models::{Meeting, Member, ReconnectRequest, ResponseOutcome, RespondRequest, SetVenueRequest};

impl Engine {
    /// Record an accept or decline and settle the community's
    /// `accepted_meetups` counter.
    ///
    /// The status change is persisted first. A failed counter write after
    /// that is logged and reported through `counters_updated`; the status
    /// change stays.
    pub async fn apply_response(&self, req: &RespondRequest) -> Result<ResponseOutcome, MeetupError> {
        req.validate()?;
        let _meeting_guard = self.locks.meeting(&req.meeting_id).await;

        let mut meeting = self
            .store
            .get_meeting(&req.meeting_id)
            .await?
            .ok_or_else(|| MeetupError::MeetingNotFound(req.meeting_id.clone()))?;

        let transition = lifecycle::apply_response(&mut meeting, &req.member_id, req.response)?;
        self.store.update_meeting(&meeting).await?;

        tracing::info!(
            "{} {:?} meeting {} ({} -> {} accepted)",
            req.member_id,
            req.response,
            meeting.id,
            transition.accepted_before,
            transition.accepted_after
        );

        let mut counters_updated = true;
        if transition.counter_delta != 0 {
            let _community_guard = self.locks.community(&meeting.community).await;
            let delta = transition.counter_delta;

            if let Err(e) = self
                .adjust_counters(&meeting.community, |c| c.accepted_meetups += delta)
                .await
            {
                tracing::warn!("{}", e);
                counters_updated = false;
            }
        }

        Ok(ResponseOutcome {
            meeting,
            accepted_before: transition.accepted_before,
            accepted_after: transition.accepted_after,
            counter_delta: transition.counter_delta,
            counters_updated,
        })
    }

    /// Set up a fresh meetup between two members of the same community
    pub async fn reconnect(&self, req: &ReconnectRequest) -> Result<Meeting, MeetupError> {
        req.validate()?;
        if req.requester == req.other {
            return Err(MeetupError::InvalidRequest(
                "cannot reconnect a member with themselves".to_string(),
            ));
        }

        let community_id = req.community_id.as_str();
        let _guard = self.locks.community(community_id).await;

        let community = self
            .store
            .get_community(community_id)
            .await?
            .ok_or_else(|| MeetupError::CommunityNotFound(community_id.to_string()))?;

        for member in [&req.requester, &req.other] {
            if !community.has_member(member) {
                return Err(MeetupError::InvalidRequest(format!(
                    "{} is not a member of {}",
                    member, community_id
                )));
            }
        }

        let members = self.load_members([req.requester.as_str(), req.other.as_str()]).await?;
        let refs: Vec<&Member> = members.iter().collect();

        let meeting = self
            .create_meetup(community_id, &refs)
            .await
            .map_err(|(_, e)| e)?;

        if let Err(e) = self
            .adjust_counters(community_id, |c| c.total_meetups += 1)
            .await
        {
            tracing::warn!("{}", e);
        }

        tracing::info!(
            "Reconnected {} and {} in meeting {}",
            req.requester,
            req.other,
            meeting.id
        );
        Ok(meeting)
    }

    /// Settle a meeting's venue from the proposed list
    pub async fn set_venue(&self, req: &SetVenueRequest) -> Result<Meeting, MeetupError> {
        req.validate()?;
        let _guard = self.locks.meeting(&req.meeting_id).await;

        let mut meeting = self
            .store
            .get_meeting(&req.meeting_id)
            .await?
            .ok_or_else(|| MeetupError::MeetingNotFound(req.meeting_id.clone()))?;

        let venue = choose_venue(meeting.location.as_deref(), &req.venues)
            .ok_or_else(|| MeetupError::InvalidRequest("no venues proposed".to_string()))?;

        meeting.location = Some(venue);
        self.store.update_meeting(&meeting).await?;

        tracing::info!("Venue for meeting {} set to {:?}", meeting.id, meeting.location);
        Ok(meeting)
    }
}

/// Venue to keep for a meeting given a new round of proposals.
///
/// No current venue takes the first proposal. A current venue that was
/// proposed again is kept. Otherwise the current venue competes with the
/// proposals and the alphabetically first wins.
pub fn choose_venue(current: Option<&str>, proposals: &[String]) -> Option<String> {
    let first = proposals.first()?;

    let Some(current) = current else {
        return Some(first.clone());
    };

    if proposals.iter().any(|v| v == current) {
        return Some(current.to_string());
    }

    proposals
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(current))
        .min()
        .map(str::to_string)
}
