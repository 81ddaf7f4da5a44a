use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::MeetupError;
use crate::models::Member;

/// Fewest opted-in members a matchup round can work with
pub const MIN_PARTICIPANTS: usize = 2;

/// Member attributes compared when deciding who may be paired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Covid,
    MeetType,
    Group,
}

impl Attribute {
    pub const COMPARED: [Attribute; 3] = [Attribute::Covid, Attribute::MeetType, Attribute::Group];

    /// Value a member holds for this attribute; missing values never form edges
    pub fn value(self, member: &Member) -> Option<&str> {
        match self {
            Attribute::Covid => member.covid.as_deref(),
            Attribute::MeetType => member.meet_type.as_deref(),
            // TODO: compare meet_group once group meetups are supported
            Attribute::Group => None,
        }
    }
}

/// Undirected "eligible to pair" relation over one matchup round
///
/// Adjacency is keyed and ordered by member identity so that every
/// traversal of the graph is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl CompatibilityGraph {
    /// Build the graph for a community's members.
    ///
    /// Opted-out members are dropped first. Fails with
    /// `InsufficientParticipants` when fewer than `min_participants` remain.
    pub fn build(members: &[Member], min_participants: usize) -> Result<Self, MeetupError> {
        let mut opted_in: BTreeMap<&str, &Member> = BTreeMap::new();
        for member in members.iter().filter(|m| m.opt_in) {
            opted_in.insert(member.id.as_str(), member);
        }

        let required = min_participants.max(MIN_PARTICIPANTS);
        if opted_in.len() < required {
            return Err(MeetupError::InsufficientParticipants {
                found: opted_in.len(),
                required,
            });
        }

        // Bucket members by shared attribute value, then link each bucket
        let mut buckets: HashMap<(Attribute, &str), Vec<&str>> = HashMap::new();
        for (id, member) in &opted_in {
            for attribute in Attribute::COMPARED {
                if let Some(value) = attribute.value(member) {
                    buckets.entry((attribute, value)).or_default().push(id);
                }
            }
        }

        let mut adjacency: BTreeMap<String, BTreeSet<String>> = opted_in
            .keys()
            .map(|id| (id.to_string(), BTreeSet::new()))
            .collect();

        for ids in buckets.values() {
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    adjacency.entry(a.to_string()).or_default().insert(b.to_string());
                    adjacency.entry(b.to_string()).or_default().insert(a.to_string());
                }
            }
        }

        tracing::debug!(
            "Built compatibility graph: {} members, {} edges",
            adjacency.len(),
            adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
        );

        Ok(Self { adjacency })
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn degree(&self, member_id: &str) -> Option<usize> {
        self.adjacency.get(member_id).map(BTreeSet::len)
    }

    pub fn neighbors(&self, member_id: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(member_id)
    }

    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub(crate) fn into_adjacency(self) -> BTreeMap<String, BTreeSet<String>> {
        self.adjacency
    }
}
