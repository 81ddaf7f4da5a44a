use std::collections::{BTreeMap, BTreeSet};

use crate::core::graph::CompatibilityGraph;
use crate::models::{LeftoverGroup, Pair};

/// Result of pairing one matchup round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub pairs: Vec<Pair>,
    /// Two or more stranded members, met as one group
    pub leftover: Option<LeftoverGroup>,
    /// A single stranded member who gets no meetup this round
    pub unmatched: Option<String>,
}

impl MatchOutcome {
    pub fn meetup_count(&self) -> usize {
        self.pairs.len() + usize::from(self.leftover.is_some())
    }
}

/// Greedy minimum-degree matcher
///
/// Repeatedly takes the pool member with the fewest remaining neighbors and
/// pairs it with its own fewest-neighbor neighbor. Degrees are live: they are
/// counted against members still in the pool. Ties break on member identity.
#[derive(Debug)]
pub struct GreedyMinDegreeMatcher {
    adjacency: BTreeMap<String, BTreeSet<String>>,
    // (current degree, identity) for every pool member
    order: BTreeSet<(usize, String)>,
}

impl GreedyMinDegreeMatcher {
    pub fn new(graph: CompatibilityGraph) -> Self {
        let adjacency = graph.into_adjacency();
        let order = adjacency
            .iter()
            .map(|(id, neighbors)| (neighbors.len(), id.clone()))
            .collect();

        Self { adjacency, order }
    }

    /// Consume the pool and produce pairs plus any leftover group
    pub fn run(mut self) -> MatchOutcome {
        let mut pairs = Vec::new();
        let mut stranded = Vec::new();

        while let Some((degree, u)) = self.order.pop_first() {
            if degree == 0 {
                self.adjacency.remove(&u);
                stranded.push(u);
                continue;
            }

            let Some(v) = self.lowest_degree_neighbor(&u) else {
                // Degree index and adjacency disagree; treat as stranded
                self.adjacency.remove(&u);
                stranded.push(u);
                continue;
            };

            self.remove_from_pool(&u);
            self.remove_from_pool(&v);

            tracing::debug!("Paired {} with {} (degree {})", u, v, degree);
            pairs.push(Pair(u, v));
        }

        let (leftover, unmatched) = match stranded.len() {
            0 => (None, None),
            1 => (None, stranded.pop()),
            _ => (Some(LeftoverGroup { members: stranded }), None),
        };

        if let Some(member) = &unmatched {
            tracing::debug!("No meetup for {} this round", member);
        }

        MatchOutcome {
            pairs,
            leftover,
            unmatched,
        }
    }

    fn lowest_degree_neighbor(&self, u: &str) -> Option<String> {
        self.adjacency
            .get(u)?
            .iter()
            .filter_map(|w| self.adjacency.get(w).map(|n| (n.len(), w)))
            .min()
            .map(|(_, w)| w.clone())
    }

    /// Drop a member from the pool, lowering the live degree of its neighbors
    fn remove_from_pool(&mut self, member: &str) {
        let Some(neighbors) = self.adjacency.remove(member) else {
            return;
        };
        self.order.remove(&(neighbors.len(), member.to_string()));

        for w in neighbors {
            if let Some(w_neighbors) = self.adjacency.get_mut(&w) {
                let old_degree = w_neighbors.len();
                w_neighbors.remove(member);
                self.order.remove(&(old_degree, w.clone()));
                self.order.insert((w_neighbors.len(), w));
            }
        }
    }
}

/// Pair up a compatibility graph in one call
pub fn match_members(graph: CompatibilityGraph) -> MatchOutcome {
    GreedyMinDegreeMatcher::new(graph).run()
}
