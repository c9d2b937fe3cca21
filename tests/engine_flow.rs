//! End-to-end turn scenarios against the sample catalog:
//! clarification golden loop, memory follow-ups, typo tolerance, and the
//! explicit no-match answer.

use std::sync::Arc;

use townie_engine::store::MemoryStore;
use townie_engine::{Catalog, Engine, SessionState, StaticReservationService, TurnInput};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_engine() -> Engine {
    let catalog = Catalog::from_json_str(include_str!("../config/catalog.sample.json")).unwrap();
    let service = Arc::new(StaticReservationService::confirming("job-test"));
    Engine::new(catalog, Box::new(MemoryStore::new()), service).unwrap()
}

fn make_session(engine: &Engine) -> SessionState {
    engine.start_session().unwrap()
}

async fn say(engine: &mut Engine, session: &mut SessionState, utterance: &str) -> String {
    engine
        .handle_turn(session, TurnInput::new(utterance).at_hour(12))
        .await
        .text
}

// ---------------------------------------------------------------------------
// Clarification golden loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_clarification_asks_in_fixed_order_then_ranks() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    let q1 = say(&mut engine, &mut session, "find me something").await;
    assert!(q1.contains("outdoors, indoors"), "vibe first, got: {q1}");
    assert!(session.clarification.is_some());

    let q2 = say(&mut engine, &mut session, "outdoors").await;
    assert!(q2.contains("budget"), "budget second, got: {q2}");

    let q3 = say(&mut engine, &mut session, "free").await;
    assert!(q3.contains("When"), "timing third, got: {q3}");

    let q4 = say(&mut engine, &mut session, "tonight").await;
    assert!(q4.contains("Who"), "company fourth, got: {q4}");

    // Fourth valid answer completes the session and runs the ranker.
    let picks = say(&mut engine, &mut session, "just me").await;
    assert!(session.clarification.is_none());
    assert!(session.memory.is_some());
    assert!(picks.contains("1."), "expected a shortlist, got: {picks}");
}

#[tokio::test]
async fn test_out_of_order_answer_still_asks_vibe_next() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "find me something").await;
    let next = say(&mut engine, &mut session, "with my friends").await;
    // Answered company while being asked vibe: applied, vibe re-asked.
    assert!(next.contains("outdoors, indoors"), "got: {next}");
    let state = session.clarification.as_ref().unwrap();
    assert!(state.social.is_some());
}

#[tokio::test]
async fn test_fully_specified_request_abandons_clarification() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "find me something").await;
    assert!(session.clarification.is_some());

    let reply = say(&mut engine, &mut session, "actually find me cheap tacos tonight").await;
    assert!(session.clarification.is_none());
    assert!(reply.contains("1."), "expected a direct shortlist, got: {reply}");
}

// ---------------------------------------------------------------------------
// Recommendation memory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_memory_is_replaced_not_appended() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "find me coffee").await;
    let first: Vec<String> = session
        .memory
        .as_ref()
        .unwrap()
        .picks
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert!(first.contains(&"bean-there".to_string()));

    say(&mut engine, &mut session, "cheap dinner tonight").await;
    let second: Vec<String> = session
        .memory
        .as_ref()
        .unwrap()
        .picks
        .iter()
        .map(|p| p.id.clone())
        .collect();

    assert!(!second.contains(&"bean-there".to_string()));
    assert!(!second.is_empty());
}

#[tokio::test]
async fn test_ordinal_follow_up_and_out_of_range_fallback() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "find me something outdoors").await;
    let picks = session.memory.as_ref().unwrap().picks.clone();
    assert!(picks.len() >= 3);

    let detail = say(&mut engine, &mut session, "2").await;
    assert!(
        detail.contains(&picks[1].name),
        "expected detail for {}, got: {detail}",
        picks[1].name
    );

    // Out of range: plain re-ranking, not an error.
    let rerank = say(&mut engine, &mut session, "6").await;
    assert!(rerank.contains("1."), "expected a fresh shortlist, got: {rerank}");
}

#[tokio::test]
async fn test_cheaper_follow_up_reruns_with_qualifier() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    say(&mut engine, &mut session, "find me dinner").await;
    let reply = say(&mut engine, &mut session, "cheaper").await;

    assert!(reply.contains("1."), "got: {reply}");
    let memory = session.memory.as_ref().unwrap();
    assert!(memory.seed_prompt.contains("cheaper"));
    // Everything surfaced now fits the cheap tiers.
    assert!(memory
        .picks
        .iter()
        .all(|p| p.price <= townie_engine::PriceTier::Budget));
}

// ---------------------------------------------------------------------------
// Near me, no-match, typo tolerance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_near_me_stays_close_without_geolocation() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    // No live location, no saved home: falls back to the campus square.
    let reply = say(&mut engine, &mut session, "what's near me").await;
    assert!(reply.contains("km away"), "got: {reply}");

    let memory = session.memory.as_ref().unwrap();
    assert!(!memory.picks.is_empty());
}

#[tokio::test]
async fn test_impossible_filters_name_the_dimension_to_loosen() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    // Every swimmable place in the sample catalog charges a fee.
    let reply = say(&mut engine, &mut session, "find me a free place to swim").await;
    assert!(reply.contains("budget"), "got: {reply}");
    assert!(!reply.contains("1."), "must not be a shortlist: {reply}");
}

#[tokio::test]
async fn test_typo_navigates_and_garbage_falls_back() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    let response = engine
        .handle_turn(&mut session, TurnInput::new("exlpore"))
        .await;
    let nav = response.navigation.expect("typo should still navigate");
    assert_eq!(nav.target_view, "explore");

    let response = engine
        .handle_turn(&mut session, TurnInput::new("zzz"))
        .await;
    assert!(response.navigation.is_none());
    assert!(!response.text.is_empty());
}

#[tokio::test]
async fn test_identical_inputs_phrase_identically() {
    let mut engine = make_engine();
    let mut session_a = make_session(&engine);
    let mut session_b = make_session(&engine);

    let a = say(&mut engine, &mut session_a, "find me something outdoors").await;
    let b = say(&mut engine, &mut session_b, "find me something outdoors").await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_status_recall_with_empty_log() {
    let mut engine = make_engine();
    let mut session = make_session(&engine);

    let reply = say(&mut engine, &mut session, "how did my reservation go").await;
    assert!(reply.contains("No reservation calls"), "got: {reply}");
}
