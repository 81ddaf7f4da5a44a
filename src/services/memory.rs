use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::models::{Community, CommunityCounters, Meeting, Member, Rating};
use crate::services::store::{DocumentStore, StoreError};

/// In-process document store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    members: RwLock<HashMap<String, Member>>,
    communities: RwLock<HashMap<String, Community>>,
    meetings: RwLock<HashMap<String, Meeting>>,
    ratings: RwLock<HashMap<String, Rating>>,
    fail_counter_writes: AtomicBool,
    member_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_member(&self, member: Member) {
        self.members.write().await.insert(member.id.clone(), member);
    }

    pub async fn insert_community(&self, community: Community) {
        self.communities.write().await.insert(community.id.clone(), community);
    }

    pub async fn insert_meeting(&self, meeting: Meeting) {
        self.meetings.write().await.insert(meeting.id.clone(), meeting);
    }

    pub async fn community(&self, community_id: &str) -> Option<Community> {
        self.communities.read().await.get(community_id).cloned()
    }

    pub async fn meeting(&self, meeting_id: &str) -> Option<Meeting> {
        self.meetings.read().await.get(meeting_id).cloned()
    }

    pub async fn meetings(&self) -> Vec<Meeting> {
        self.meetings.read().await.values().cloned().collect()
    }

    pub async fn rating(&self, meeting_id: &str) -> Option<Rating> {
        self.ratings.read().await.get(meeting_id).cloned()
    }

    /// Make every counter write fail, for exercising partial-failure paths
    pub fn fail_counter_writes(&self, fail: bool) {
        self.fail_counter_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of member lookups served so far
    pub fn member_reads(&self) -> usize {
        self.member_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_member(&self, member_id: &str) -> Result<Option<Member>, StoreError> {
        self.member_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.members.read().await.get(member_id).cloned())
    }

    async fn get_community(&self, community_id: &str) -> Result<Option<Community>, StoreError> {
        Ok(self.community(community_id).await)
    }

    async fn update_community_counters(
        &self,
        community_id: &str,
        counters: &CommunityCounters,
    ) -> Result<(), StoreError> {
        if self.fail_counter_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                message: "counter writes disabled".to_string(),
            });
        }

        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| StoreError::NotFound(community_id.to_string()))?;
        community.counters = *counters;
        Ok(())
    }

    async fn create_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        let mut meetings = self.meetings.write().await;
        if meetings.contains_key(&meeting.id) {
            return Err(StoreError::Conflict(meeting.id.clone()));
        }
        meetings.insert(meeting.id.clone(), meeting.clone());
        Ok(())
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>, StoreError> {
        Ok(self.meeting(meeting_id).await)
    }

    async fn update_meeting(&self, meeting: &Meeting) -> Result<(), StoreError> {
        let mut meetings = self.meetings.write().await;
        let stored = meetings
            .get_mut(&meeting.id)
            .ok_or_else(|| StoreError::NotFound(meeting.id.clone()))?;

        stored.user_list = meeting.user_list.clone();
        stored.timestamp = meeting.timestamp;
        stored.duration = meeting.duration;
        stored.location = meeting.location.clone();
        Ok(())
    }

    async fn create_rating(&self, rating: &Rating) -> Result<(), StoreError> {
        let mut ratings = self.ratings.write().await;
        if ratings.contains_key(&rating.meeting_id) {
            return Err(StoreError::Conflict(rating.meeting_id.clone()));
        }
        ratings.insert(rating.meeting_id.clone(), rating.clone());
        Ok(())
    }
}
