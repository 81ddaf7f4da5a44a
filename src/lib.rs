//! Meetup Engine - matching and scheduling core for recurring community meetups
//!
//! Pairs a community's opted-in members over an attribute compatibility
//! graph, resolves common meeting windows across participants' weekly
//! availability, and tracks meetup acceptance against community counters.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use core::{find_meeting_time, match_members, CompatibilityGraph, MatchOutcome, SlotInterval};
pub use engine::{Engine, EngineOptions};
pub use error::MeetupError;
pub use models::{Community, Meeting, MeetingProposal, Member, Pair};
