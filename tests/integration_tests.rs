// Integration tests for Meetup Engine

use meetup_engine::core::slot_of;
use meetup_engine::engine::{Engine, EngineOptions, IdGenerator};
use meetup_engine::models::{
    Community, CommunityCounters, MatchupRequest, Meeting, MeetingType, MeetupResponse, Member,
    ReconnectRequest, RescheduleRequest, ResolveTimeRequest, RespondRequest, ResponseStatus,
    SetVenueRequest,
};
use meetup_engine::services::{DocumentStore, MemoryStore};
use meetup_engine::{MeetupError, SlotInterval};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// 2024-01-01 00:00:00 UTC, a Monday
const MONDAY: i64 = 1_704_067_200;
const HOUR: i64 = 3600;

/// Hands out meeting-1, meeting-2, ...
#[derive(Default)]
struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        format!("meeting-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn create_test_member(id: &str, covid: &str, meet_type: &str) -> Member {
    Member::new(id).with_covid(covid).with_meet_type(meet_type)
}

fn with_schedule(mut member: Member, hours: &[(i64, i64)]) -> Member {
    member.schedule = hours
        .iter()
        .map(|(s, e)| (MONDAY + s * HOUR, MONDAY + e * HOUR))
        .collect();
    member
}

fn create_test_community(id: &str, members: &[&str]) -> Community {
    Community {
        id: id.to_string(),
        name: id.to_string(),
        admins: members.iter().take(1).map(|s| s.to_string()).collect(),
        members: members.iter().map(|s| s.to_string()).collect(),
        counters: CommunityCounters::default(),
    }
}

async fn setup(members: Vec<Member>, community_members: &[&str]) -> (Arc<MemoryStore>, Engine) {
    let store = Arc::new(MemoryStore::new());
    for member in members {
        store.insert_member(member).await;
    }
    store
        .insert_community(create_test_community("exponent", community_members))
        .await;

    let engine = Engine::with_ids(
        store.clone(),
        EngineOptions::default(),
        Arc::new(SequentialIds::default()),
    );
    (store, engine)
}

fn matchup() -> MatchupRequest {
    MatchupRequest {
        community_id: "exponent".to_string(),
    }
}

#[tokio::test]
async fn test_matchup_pairs_two_members() {
    let (store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("alisa", "gloves", "inperson"),
        ],
        &["ryan", "alisa"],
    )
    .await;

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.created.len(), 1);
    assert!(report.skipped.is_empty());
    assert!(report.counters_updated);

    let meeting = store.meeting("meeting-1").await.unwrap();
    assert_eq!(meeting.community, "exponent");
    assert_eq!(meeting.meeting_type, MeetingType::InPerson);
    assert!(meeting.user_list.values().all(|s| *s == ResponseStatus::Pending));

    let rating = store.rating("meeting-1").await.unwrap();
    assert_eq!(rating.rating_dict.len(), 2);
    assert!(rating.rating_dict.values().all(Option::is_none));

    let counters = store.community("exponent").await.unwrap().counters;
    assert_eq!(counters.total_meetups, 1);
    assert_eq!(counters.total_sessions, 1);
    assert_eq!(counters.accepted_meetups, 0);
}

#[tokio::test]
async fn test_matchup_filters_opted_out() {
    let (_store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("alisa", "gloves", "inperson"),
            create_test_member("alex", "gloves", "inperson").opted_out(),
            create_test_member("jordan", "gloves", "inperson").opted_out(),
        ],
        &["ryan", "alisa", "alex", "jordan"],
    )
    .await;

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert_eq!(report.created.len(), 1);
    let meeting = &report.created[0];
    assert!(meeting.user_list.contains_key("ryan"));
    assert!(meeting.user_list.contains_key("alisa"));
}

#[tokio::test]
async fn test_matchup_different_preferences() {
    let (store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("alisa", "gloves", "inperson"),
            create_test_member("alex", "mask", "zoom"),
            create_test_member("jordan", "mask", "zoom"),
        ],
        &["ryan", "alisa", "alex", "jordan"],
    )
    .await;

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert_eq!(report.created.len(), 2);
    let virtual_meeting = report
        .created
        .iter()
        .find(|m| m.user_list.contains_key("alex"))
        .unwrap();
    assert!(virtual_meeting.user_list.contains_key("jordan"));
    assert_eq!(virtual_meeting.meeting_type, MeetingType::Virtual);

    assert_eq!(store.community("exponent").await.unwrap().counters.total_meetups, 2);
}

#[tokio::test]
async fn test_matchup_not_enough_users() {
    let (store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("alisa", "gloves", "inperson"),
        ],
        &["ryan"],
    )
    .await;

    let err = engine.run_matchup(&matchup()).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Not enough users in this community: 1. Need at least 2."
    );
    assert!(store.meetings().await.is_empty());
    assert_eq!(
        store.community("exponent").await.unwrap().counters,
        CommunityCounters::default()
    );
}

#[tokio::test]
async fn test_matchup_groups_leftovers() {
    let (store, engine) = setup(
        vec![
            create_test_member("a", "gloves", "inperson"),
            create_test_member("b", "mask", "zoom"),
            create_test_member("c", "none", "walk"),
        ],
        &["a", "b", "c"],
    )
    .await;

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert!(report.pairs.is_empty());
    assert_eq!(report.leftover.as_ref().unwrap().members.len(), 3);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].user_list.len(), 3);
    assert_eq!(store.rating("meeting-1").await.unwrap().rating_dict.len(), 3);
}

#[tokio::test]
async fn test_matchup_skips_duplicate_meeting_id() {
    let members: Vec<Member> = ["a", "b", "c", "d"]
        .iter()
        .map(|id| create_test_member(id, "gloves", "inperson"))
        .collect();
    let (store, engine) = setup(members, &["a", "b", "c", "d"]).await;

    // The first generated id is already taken
    store
        .insert_meeting(Meeting::new(
            "meeting-1".into(),
            "other",
            ["x", "y"],
            MeetingType::InPerson,
        ))
        .await;

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert_eq!(report.pairs.len(), 2);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].id, "meeting-2");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].meeting_id, "meeting-1");
    assert!(report.skipped[0].reason.contains("already taken"));

    assert_eq!(store.community("exponent").await.unwrap().counters.total_meetups, 1);
}

#[tokio::test]
async fn test_matchup_counter_failure_keeps_meetups() {
    let (store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("alisa", "gloves", "inperson"),
        ],
        &["ryan", "alisa"],
    )
    .await;
    store.fail_counter_writes(true);

    let report = engine.run_matchup(&matchup()).await.unwrap();

    assert!(!report.counters_updated);
    assert_eq!(report.created.len(), 1);
    assert!(store.meeting("meeting-1").await.is_some());
}

#[tokio::test]
async fn test_matchup_proposes_initial_time() {
    let (store, engine) = setup(
        vec![
            with_schedule(create_test_member("ryan", "gloves", "inperson"), &[(9, 10), (11, 14)]),
            with_schedule(create_test_member("alisa", "gloves", "inperson"), &[(11, 15), (16, 17)]),
        ],
        &["ryan", "alisa"],
    )
    .await;

    engine.run_matchup(&matchup()).await.unwrap();

    let meeting = store.meeting("meeting-1").await.unwrap();
    let timestamp = meeting.timestamp.expect("meeting should be scheduled");
    assert_eq!(slot_of(&timestamp), 11);
    assert_eq!(meeting.duration, 3);
}

#[tokio::test]
async fn test_unknown_community() {
    let (_store, engine) = setup(vec![], &[]).await;
    let err = engine
        .run_matchup(&MatchupRequest {
            community_id: "nowhere".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MeetupError::CommunityNotFound(_)));
}

async fn accepted_meeting_setup() -> (Arc<MemoryStore>, Engine) {
    let (store, engine) = setup(vec![], &["a", "b", "c"]).await;
    store
        .insert_meeting(Meeting::new(
            "m1".into(),
            "exponent",
            ["a", "b", "c"],
            MeetingType::InPerson,
        ))
        .await;
    (store, engine)
}

fn respond(member: &str, response: MeetupResponse) -> RespondRequest {
    RespondRequest {
        meeting_id: "m1".to_string(),
        member_id: member.to_string(),
        response,
    }
}

#[tokio::test]
async fn test_accept_reaching_quorum_adjusts_counter_once() {
    let (store, engine) = accepted_meeting_setup().await;

    let first = engine.apply_response(&respond("a", MeetupResponse::Accept)).await.unwrap();
    assert_eq!(first.counter_delta, 0);

    let second = engine.apply_response(&respond("b", MeetupResponse::Accept)).await.unwrap();
    assert_eq!(second.counter_delta, -1);
    assert!(second.counters_updated);

    let third = engine.apply_response(&respond("c", MeetupResponse::Accept)).await.unwrap();
    assert_eq!(third.counter_delta, 0);

    assert_eq!(store.community("exponent").await.unwrap().counters.accepted_meetups, -1);
    assert_eq!(store.meeting("m1").await.unwrap().accepted_count(), 3);
}

#[tokio::test]
async fn test_decline_losing_quorum_adjusts_again() {
    let (store, engine) = accepted_meeting_setup().await;

    engine.apply_response(&respond("a", MeetupResponse::Accept)).await.unwrap();
    engine.apply_response(&respond("b", MeetupResponse::Accept)).await.unwrap();
    let outcome = engine.apply_response(&respond("a", MeetupResponse::Decline)).await.unwrap();

    assert_eq!((outcome.accepted_before, outcome.accepted_after), (2, 1));
    assert_eq!(outcome.counter_delta, -1);
    assert_eq!(outcome.meeting.user_list["a"], ResponseStatus::Declined);
    assert_eq!(store.community("exponent").await.unwrap().counters.accepted_meetups, -2);
}

#[tokio::test]
async fn test_response_from_non_participant_rejected() {
    let (store, engine) = accepted_meeting_setup().await;

    let err = engine
        .apply_response(&respond("zed", MeetupResponse::Accept))
        .await
        .unwrap_err();

    assert!(matches!(err, MeetupError::MemberNotInMeeting { .. }));
    assert_eq!(store.meeting("m1").await.unwrap().accepted_count(), 0);
}

#[tokio::test]
async fn test_counter_failure_keeps_status_change() {
    let (store, engine) = accepted_meeting_setup().await;
    engine.apply_response(&respond("a", MeetupResponse::Accept)).await.unwrap();

    store.fail_counter_writes(true);
    let outcome = engine.apply_response(&respond("b", MeetupResponse::Accept)).await.unwrap();

    assert_eq!(outcome.counter_delta, -1);
    assert!(!outcome.counters_updated);
    assert_eq!(store.meeting("m1").await.unwrap().user_list["b"], ResponseStatus::Accepted);
    assert_eq!(store.community("exponent").await.unwrap().counters.accepted_meetups, 0);
}

#[tokio::test]
async fn test_concurrent_accepts_are_serialized() {
    let (store, engine) = accepted_meeting_setup().await;

    let tasks: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|member| {
            let engine = engine.clone();
            let req = respond(member, MeetupResponse::Accept);
            tokio::spawn(async move { engine.apply_response(&req).await.unwrap() })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(store.meeting("m1").await.unwrap().accepted_count(), 3);
    assert_eq!(store.community("exponent").await.unwrap().counters.accepted_meetups, -1);
}

#[tokio::test]
async fn test_resolve_time_from_stored_schedules() {
    let (_store, engine) = setup(
        vec![
            with_schedule(Member::new("p1"), &[(9, 10), (11, 14)]),
            with_schedule(Member::new("p2"), &[(11, 15), (16, 17)]),
            with_schedule(Member::new("p3"), &[(12, 13), (13, 15)]),
        ],
        &[],
    )
    .await;

    let two = engine
        .resolve_time(&ResolveTimeRequest {
            participants: vec!["p1".into(), "p2".into()],
            meeting_length: None,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(two.interval, SlotInterval::new(11, 14));
    assert_eq!(two.participants, vec!["p1", "p2"]);

    // Converted schedules are merged, so p3 reads as one window [12, 15)
    let three = engine
        .resolve_time(&ResolveTimeRequest {
            participants: vec!["p1".into(), "p2".into(), "p3".into()],
            meeting_length: Some(1),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(three.interval, SlotInterval::new(12, 13));

    let none = engine
        .resolve_time(&ResolveTimeRequest {
            participants: vec!["p1".into(), "p2".into()],
            meeting_length: Some(4),
        })
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_resolve_time_unknown_member() {
    let (_store, engine) = setup(vec![Member::new("p1")], &[]).await;

    let err = engine
        .resolve_time(&ResolveTimeRequest {
            participants: vec!["p1".into(), "ghost".into()],
            meeting_length: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MeetupError::MemberNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn test_reschedule_updates_meeting() {
    let (store, engine) = setup(
        vec![
            with_schedule(Member::new("a"), &[(33, 37)]),
            with_schedule(Member::new("b"), &[(34, 36)]),
        ],
        &["a", "b"],
    )
    .await;
    store
        .insert_meeting(Meeting::new("m1".into(), "exponent", ["a", "b"], MeetingType::InPerson))
        .await;

    let proposal = engine
        .reschedule(&RescheduleRequest {
            meeting_id: "m1".into(),
            meeting_length: Some(1),
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(proposal.interval, SlotInterval::new(34, 35));
    let meeting = store.meeting("m1").await.unwrap();
    assert_eq!(slot_of(&meeting.timestamp.unwrap()), 34);
    assert_eq!(meeting.duration, 1);
}

#[tokio::test]
async fn test_reschedule_without_common_window_leaves_meeting() {
    let (store, engine) = setup(
        vec![
            with_schedule(Member::new("a"), &[(9, 12)]),
            with_schedule(Member::new("b"), &[(13, 17)]),
        ],
        &["a", "b"],
    )
    .await;
    store
        .insert_meeting(Meeting::new("m1".into(), "exponent", ["a", "b"], MeetingType::InPerson))
        .await;

    let proposal = engine
        .reschedule(&RescheduleRequest {
            meeting_id: "m1".into(),
            meeting_length: None,
        })
        .await
        .unwrap();

    assert!(proposal.is_none());
    assert!(store.meeting("m1").await.unwrap().timestamp.is_none());
}

#[tokio::test]
async fn test_reconnect_creates_meeting() {
    let (store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("stephen", "gloves", "inperson"),
        ],
        &["ryan", "stephen"],
    )
    .await;

    let meeting = engine
        .reconnect(&ReconnectRequest {
            community_id: "exponent".into(),
            requester: "ryan".into(),
            other: "stephen".into(),
        })
        .await
        .unwrap();

    assert_eq!(meeting.user_list.len(), 2);
    assert!(store.get_meeting(&meeting.id).await.unwrap().is_some());
    assert!(store.rating(&meeting.id).await.is_some());
    assert_eq!(store.community("exponent").await.unwrap().counters.total_meetups, 1);
}

#[tokio::test]
async fn test_reconnect_requires_membership() {
    let (_store, engine) = setup(
        vec![
            create_test_member("ryan", "gloves", "inperson"),
            create_test_member("outsider", "gloves", "inperson"),
        ],
        &["ryan"],
    )
    .await;

    let err = engine
        .reconnect(&ReconnectRequest {
            community_id: "exponent".into(),
            requester: "ryan".into(),
            other: "outsider".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, MeetupError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_set_venue() {
    let (store, engine) = setup(vec![], &["a", "b"]).await;
    store
        .insert_meeting(Meeting::new("m1".into(), "exponent", ["a", "b"], MeetingType::InPerson))
        .await;

    let meeting = engine
        .set_venue(&SetVenueRequest {
            meeting_id: "m1".into(),
            venues: vec!["Library".into(), "Cafe".into()],
        })
        .await
        .unwrap();
    assert_eq!(meeting.location.as_deref(), Some("Library"));

    let meeting = engine
        .set_venue(&SetVenueRequest {
            meeting_id: "m1".into(),
            venues: vec!["Cafe".into(), "Library".into()],
        })
        .await
        .unwrap();
    assert_eq!(meeting.location.as_deref(), Some("Library"));
    assert_eq!(
        store.meeting("m1").await.unwrap().location.as_deref(),
        Some("Library")
    );

    let err = engine
        .set_venue(&SetVenueRequest {
            meeting_id: "m1".into(),
            venues: vec![],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MeetupError::InvalidRequest(_)));
}
