use std::collections::{BTreeSet, HashMap};
use validator::Validate;

use crate::core::{match_members, CompatibilityGraph};
use crate::engine::schedule::{apply_proposal, propose};
use crate::engine::Engine;
use crate::error::MeetupError;
use crate::models::{
    MatchupReport, MatchupRequest, Meeting, MeetingType, Member, Rating, SkippedMeetup,
};
use crate::services::StoreError;

impl Engine {
    /// Run one matchup round over a community.
    ///
    /// Pairs the opted-in members, creates a meeting and rating stub per
    /// pair (plus one for a leftover group), then bumps the community
    /// counters. Too few opted-in members aborts before anything is written.
    /// A meetup whose id is taken is skipped; a failed counter write is
    /// logged. Both leave the rest of the round in place.
    pub async fn run_matchup(&self, req: &MatchupRequest) -> Result<MatchupReport, MeetupError> {
        req.validate()?;
        let community_id = req.community_id.as_str();
        let _guard = self.locks.community(community_id).await;

        tracing::info!("Starting matchup for community {}", community_id);

        let community = self
            .store
            .get_community(community_id)
            .await?
            .ok_or_else(|| MeetupError::CommunityNotFound(community_id.to_string()))?;

        let mut members = Vec::with_capacity(community.members.len());
        let mut seen = BTreeSet::new();
        for id in &community.members {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.store.get_member(id).await? {
                Some(member) => members.push(member),
                None => tracing::warn!("Member {} of {} has no account, skipping", id, community_id),
            }
        }

        let graph = CompatibilityGraph::build(&members, self.options.min_participants).map_err(|e| {
            tracing::error!("Matchup for {} aborted: {}", community_id, e);
            e
        })?;
        let outcome = match_members(graph);

        tracing::info!(
            "Matched {} pairs in {} (leftover group: {}, unmatched: {:?})",
            outcome.pairs.len(),
            community_id,
            outcome.leftover.as_ref().map_or(0, |g| g.members.len()),
            outcome.unmatched
        );

        let by_id: HashMap<&str, &Member> = members.iter().map(|m| (m.id.as_str(), m)).collect();
        let groups = outcome
            .pairs
            .iter()
            .map(|p| p.members().to_vec())
            .chain(outcome.leftover.iter().map(|g| g.members.iter().map(String::as_str).collect()));

        let mut created = Vec::new();
        let mut skipped = Vec::new();

        for group in groups {
            let participants: Vec<&Member> = group.iter().filter_map(|id| by_id.get(id).copied()).collect();

            match self.create_meetup(community_id, &participants).await {
                Ok(meeting) => created.push(meeting),
                Err((meeting_id, e)) => {
                    tracing::warn!("Skipping meetup for {:?}: {}", group, e);
                    skipped.push(SkippedMeetup {
                        members: group.iter().map(|s| s.to_string()).collect(),
                        meeting_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let new_meetups = created.len() as i64;
        let counters_updated = match self
            .adjust_counters(community_id, |c| {
                c.total_meetups += new_meetups;
                c.total_sessions += 1;
            })
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        };

        tracing::info!(
            "Matchup for {} created {} meetups ({} skipped)",
            community_id,
            created.len(),
            skipped.len()
        );

        Ok(MatchupReport {
            community: community_id.to_string(),
            pairs: outcome.pairs,
            leftover: outcome.leftover,
            created,
            skipped,
            counters_updated,
        })
    }

    /// Persist one meetup and its rating stub.
    ///
    /// On failure returns the id that was tried with the reason. A taken id
    /// maps to `DuplicateMeetingId`. A failed rating stub is only logged.
    pub(crate) async fn create_meetup(
        &self,
        community_id: &str,
        participants: &[&Member],
    ) -> Result<Meeting, (String, MeetupError)> {
        let id = self.ids.next_id();
        let mut meeting = Meeting::new(
            id.clone(),
            community_id,
            participants.iter().map(|m| m.id.clone()),
            MeetingType::for_participants(participants),
        );

        let length = self.meeting_length_for(participants, None);
        if let Some(proposal) = propose(participants, length) {
            apply_proposal(&mut meeting, &proposal);
        }

        match self.store.create_meeting(&meeting).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err((id.clone(), MeetupError::DuplicateMeetingId(id))),
            Err(e) => return Err((id, MeetupError::Store(e))),
        }

        if let Err(e) = self.store.create_rating(&Rating::stub_for(&meeting)).await {
            tracing::warn!("Failed to create rating stub for meeting {}: {}", meeting.id, e);
        }

        tracing::debug!("Created meeting {} for {:?}", meeting.id, meeting.user_list.keys());
        Ok(meeting)
    }
}
