//! Typed entry points over the document store
//!
//! Each call loads what it needs eagerly, runs the synchronous algorithms
//! from [`crate::core`], and writes results back under the per-entity lock.

pub mod matchup;
pub mod meetings;
pub mod schedule;

use std::sync::Arc;

use crate::core::MIN_PARTICIPANTS;
use crate::error::MeetupError;
use crate::models::{CommunityCounters, Member};
use crate::services::{DocumentStore, EntityLocks};

pub use schedule::propose;

/// Source of identifiers for new meeting documents
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs without dashes
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub min_participants: usize,
    /// Slots to reserve when neither the caller nor the members ask for a length
    pub default_meeting_length: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_participants: MIN_PARTICIPANTS,
            default_meeting_length: None,
        }
    }
}

/// Matching and scheduling engine shared across callers
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    locks: Arc<EntityLocks>,
    ids: Arc<dyn IdGenerator>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>, options: EngineOptions) -> Self {
        Self::with_ids(store, options, Arc::new(UuidIds))
    }

    pub fn with_ids(
        store: Arc<dyn DocumentStore>,
        options: EngineOptions,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            locks: Arc::new(EntityLocks::new()),
            ids,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Load member accounts, failing on the first missing one
    async fn load_members<'a, I>(&self, member_ids: I) -> Result<Vec<Member>, MeetupError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut members = Vec::new();
        for id in member_ids {
            let member = self
                .store
                .get_member(id)
                .await?
                .ok_or_else(|| MeetupError::MemberNotFound(id.to_string()))?;
            members.push(member);
        }
        Ok(members)
    }

    /// Read-modify-write the community counters.
    ///
    /// Callers hold the community lock. Failures come back as
    /// `CounterUpdateFailure` for the caller to log.
    async fn adjust_counters<F>(&self, community_id: &str, adjust: F) -> Result<CommunityCounters, MeetupError>
    where
        F: FnOnce(&mut CommunityCounters),
    {
        let failure = |source| MeetupError::CounterUpdateFailure {
            community: community_id.to_string(),
            source,
        };

        let community = self
            .store
            .get_community(community_id)
            .await
            .map_err(failure)?
            .ok_or_else(|| MeetupError::CommunityNotFound(community_id.to_string()))?;

        let mut counters = community.counters;
        adjust(&mut counters);

        self.store
            .update_community_counters(community_id, &counters)
            .await
            .map_err(failure)?;

        tracing::debug!("Counters for {} now {:?}", community_id, counters);
        Ok(counters)
    }
}
