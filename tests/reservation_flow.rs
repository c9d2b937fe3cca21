//! Reservation flow round trips: draft → confirm → submit → poll →
//! exactly one terminal notification, plus the edit/cancel/failure paths.

use std::sync::Arc;
use std::time::Duration;

use townie_engine::reservation::service::{
    CallStatus, CallStatusResponse, ReservationDecision,
};
use townie_engine::store::MemoryStore;
use townie_engine::{Catalog, Engine, SessionState, StaticReservationService, TurnInput};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_catalog() -> Catalog {
    Catalog::from_json_str(include_str!("../config/catalog.sample.json")).unwrap()
}

fn make_engine(service: Arc<StaticReservationService>) -> Engine {
    Engine::new(sample_catalog(), Box::new(MemoryStore::new()), service)
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
}

fn make_session(engine: &Engine) -> SessionState {
    engine.start_session().unwrap()
}

async fn say(engine: &mut Engine, session: &mut SessionState, utterance: &str) -> String {
    engine
        .handle_turn(session, TurnInput::new(utterance).at_hour(18))
        .await
        .text
}

fn step(status: CallStatus, decision: ReservationDecision) -> CallStatusResponse {
    CallStatusResponse {
        status,
        reservation_decision: decision,
        restaurant_name: String::new(),
        reservation_time: String::new(),
        party_size: 0,
        last_error: None,
    }
}

// ---------------------------------------------------------------------------
// Golden round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_draft_confirm_poll_notify_once() {
    let service = Arc::new(StaticReservationService::confirming("job-1"));
    let mut engine = make_engine(service.clone());
    let mut session = make_session(&engine);

    // Draft.
    let draft_reply = say(
        &mut engine,
        &mut session,
        "book a table at Luigi's Trattoria for 4 at 7pm",
    )
    .await;
    assert!(draft_reply.contains("Party: 4"), "got: {draft_reply}");
    assert_eq!(session.draft.as_ref().unwrap().party_size, 4);

    // Confirm → submit, job id recorded.
    let submit_reply = say(&mut engine, &mut session, "yes").await;
    assert!(submit_reply.contains("Calling Luigi's Trattoria"), "got: {submit_reply}");
    assert!(session.draft.is_none());
    assert!(engine.store().get("reservation.status.job-1").is_some());

    // Let the poller reach the terminal decision.
    tokio::time::sleep(Duration::from_millis(120)).await;

    let notes = engine.drain_notifications();
    let confirmations: Vec<&String> = notes.iter().filter(|n| n.contains("confirmed")).collect();
    assert_eq!(confirmations.len(), 1, "exactly one notification: {notes:?}");
    assert!(confirmations[0].contains("Luigi's Trattoria"));

    // Polling stopped at the terminal decision.
    let polls = service.poll_count();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(service.poll_count(), polls);
    assert!(engine.drain_notifications().is_empty());

    // The status log reflects the outcome and answers recall.
    let recall = say(&mut engine, &mut session, "how did my reservation go").await;
    assert!(recall.contains("confirmed"), "got: {recall}");
}

// ---------------------------------------------------------------------------
// Edit / cancel / replace
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_edit_reply_updates_draft_and_represents() {
    let service = Arc::new(StaticReservationService::confirming("job-2"));
    let mut engine = make_engine(service);
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;

    let edited = say(&mut engine, &mut session, "make it 8pm instead").await;
    assert!(edited.contains("8:00 PM"), "got: {edited}");
    assert!(session.draft.is_some());

    let edited = say(&mut engine, &mut session, "actually for 6").await;
    assert_eq!(session.draft.as_ref().unwrap().party_size, 6);
    assert!(edited.contains("Party: 6"), "got: {edited}");
}

#[tokio::test]
async fn test_negative_reply_cancels_cleanly() {
    let service = Arc::new(StaticReservationService::confirming("job-3"));
    let mut engine = make_engine(service.clone());
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;
    let reply = say(&mut engine, &mut session, "no, cancel that").await;

    assert!(session.draft.is_none());
    assert!(reply.contains("nothing was sent"), "got: {reply}");
    assert_eq!(service.poll_count(), 0);
}

#[tokio::test]
async fn test_new_reservation_intent_replaces_pending_draft() {
    let service = Arc::new(StaticReservationService::confirming("job-4"));
    let mut engine = make_engine(service);
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;
    let reply = say(
        &mut engine,
        &mut session,
        "actually book a table at Rosa's Cantina for 3",
    )
    .await;

    assert!(reply.contains("Dropping the Luigi's Trattoria request"), "got: {reply}");
    let draft = session.draft.as_ref().unwrap();
    assert_eq!(draft.restaurant_name, "Rosa's Cantina");
    assert_eq!(draft.party_size, 3);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unresolvable_target_asks_instead_of_guessing() {
    let service = Arc::new(StaticReservationService::confirming("job-5"));
    let mut engine = make_engine(service);
    let mut session = make_session(&engine);

    let reply = say(&mut engine, &mut session, "book a table for 4 at 7pm").await;
    assert!(session.draft.is_none());
    assert!(reply.contains("which restaurant"), "got: {reply}");
}

#[tokio::test]
async fn test_submit_failure_clears_draft_for_retry() {
    let service = Arc::new(StaticReservationService::failing_start("dialer down"));
    let mut engine = make_engine(service);
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;
    let reply = say(&mut engine, &mut session, "yes").await;

    assert!(reply.contains("dialer down"), "got: {reply}");
    assert!(session.draft.is_none());

    // The user can immediately start over.
    let retry = say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;
    assert!(retry.contains("Party: 2"), "got: {retry}");
}

#[tokio::test]
async fn test_declined_timeout_notification() {
    let service = Arc::new(StaticReservationService::with_script(
        "job-6",
        vec![
            step(CallStatus::InProgress, ReservationDecision::Pending),
            step(CallStatus::Completed, ReservationDecision::DeclinedTimeout),
        ],
    ));
    let mut engine = make_engine(service);
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "book Luigi's Trattoria for 2").await;
    say(&mut engine, &mut session, "yes").await;

    tokio::time::sleep(Duration::from_millis(120)).await;
    let notes = engine.drain_notifications();
    assert_eq!(notes.len(), 1, "got: {notes:?}");
    assert!(notes[0].contains("couldn't get an answer"), "got: {notes:?}");
}
