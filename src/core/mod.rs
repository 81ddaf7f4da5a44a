// Core algorithm exports
pub mod availability;
pub mod graph;
pub mod lifecycle;
pub mod pairing;
pub mod timeslot;

pub use availability::{find_meeting_time, intersect_lists, SlotInterval};
pub use graph::{Attribute, CompatibilityGraph, MIN_PARTICIPANTS};
pub use lifecycle::{apply_response, quorum_delta, Transition, QUORUM};
pub use pairing::{match_members, GreedyMinDegreeMatcher, MatchOutcome};
pub use timeslot::{next_occurrence, slot_of, to_weekly_intervals, SLOTS_PER_WEEK};
