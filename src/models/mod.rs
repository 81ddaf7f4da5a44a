// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Community, CommunityCounters, LeftoverGroup, Meeting, MeetingProposal, MeetingType, Member,
    Pair, Rating, ResponseStatus,
};
pub use requests::{
    MatchupRequest, MeetupResponse, ReconnectRequest, RescheduleRequest, ResolveTimeRequest,
    RespondRequest, SetVenueRequest,
};
pub use responses::{MatchupReport, ResponseOutcome, SkippedMeetup};
