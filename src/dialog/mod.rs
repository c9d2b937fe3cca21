//! The dialog engine: one synchronous turn at a time over an explicit
//! session value.
//!
//! Session state (profile, clarification, memory, pending draft) lives in
//! [`SessionState`] and is threaded through each turn, with no ambient
//! mutable state, so the coupling between components stays visible. The
//! only background work is reservation-status polling, whose updates are
//! drained between turns.

pub mod clarify;
pub mod memory;
pub mod draft;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::geo::{self, GeoPoint, HomeLocation};
use crate::nlu::context::{self, FindContext, Social, Vibe};
use crate::nlu::fuzzy;
use crate::nlu::intent::{self, FollowUp, Intent, SessionView};
use crate::nlu::rules::{FlowKind, RuleBook};
use crate::profile::PreferenceProfile;
use crate::rank::{self, RankOutcome, RankedPlace};
use crate::reservation::service::ReservationService;
use crate::reservation::tracker::{spawn_poller, PollEvent};
use crate::store::{self, KeyValueStore, HOME_LOCATION_KEY, RESERVATION_STATUS_PREFIX};

use clarify::ClarificationState;
use memory::{RecKind, RecommendationMemory};
use draft::{ConfirmReply, ReservationDraft, ReservationStatusRecord};

/// How often a submitted call is polled.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Inputs for one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub utterance: &'a str,
    pub live_location: Option<GeoPoint>,
    pub local_hour: u32,
}

impl<'a> TurnInput<'a> {
    pub fn new(utterance: &'a str) -> Self {
        Self {
            utterance,
            live_location: None,
            local_hour: 12,
        }
    }

    pub fn at_hour(mut self, hour: u32) -> Self {
        self.local_hour = hour;
        self
    }

    pub fn with_location(mut self, point: GeoPoint) -> Self {
        self.live_location = Some(point);
        self
    }
}

/// A navigation suggestion for the surrounding app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavSuggestion {
    pub target_view: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Plan,
    Jam,
    Pin,
}

/// A follow-up affordance the app can render under the reply.
#[derive(Debug, Clone)]
pub struct ActionAffordance {
    pub kind: ActionKind,
    pub label: String,
    pub data: Option<serde_json::Value>,
}

/// One turn's output. `text` is never empty.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub text: String,
    pub navigation: Option<NavSuggestion>,
    pub actions: Vec<ActionAffordance>,
}

impl TurnResponse {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            navigation: None,
            actions: Vec::new(),
        }
    }
}

/// Session-scoped state, owned by the caller and threaded through each
/// turn. Exactly one of clarification / pending draft is active at a
/// time; the engine enforces that when flows start.
pub struct SessionState {
    pub id: Uuid,
    pub profile: PreferenceProfile,
    pub home: Option<HomeLocation>,
    pub clarification: Option<ClarificationState>,
    pub memory: Option<RecommendationMemory>,
    pub draft: Option<ReservationDraft>,
    pollers: Vec<JoinHandle<()>>,
}

impl Drop for SessionState {
    fn drop(&mut self) {
        for handle in self.pollers.drain(..) {
            handle.abort();
        }
    }
}

/// The conversational engine. Construction loads the rule table once;
/// each turn is processed synchronously to completion.
pub struct Engine {
    catalog: Catalog,
    rules: RuleBook,
    service: Arc<dyn ReservationService>,
    store: Box<dyn KeyValueStore>,
    poll_interval: Duration,
    events_tx: UnboundedSender<PollEvent>,
    events_rx: UnboundedReceiver<PollEvent>,
}

impl Engine {
    pub fn new(
        catalog: Catalog,
        store: Box<dyn KeyValueStore>,
        service: Arc<dyn ReservationService>,
    ) -> Result<Self, EngineError> {
        let rules = RuleBook::embedded()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            catalog,
            rules,
            service,
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
            events_tx,
            events_rx,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Open a session: read the preference profile and saved home
    /// location from persisted state.
    pub fn start_session(&self) -> Result<SessionState, EngineError> {
        let profile = PreferenceProfile::load(self.store.as_ref())?;
        let home: Option<HomeLocation> = store::get_json(self.store.as_ref(), HOME_LOCATION_KEY)?;
        info!(
            trained = profile.has_training_data(),
            completeness = profile.completeness(),
            "session opened"
        );
        Ok(SessionState {
            id: Uuid::new_v4(),
            profile,
            home,
            clarification: None,
            memory: None,
            draft: None,
            pollers: Vec::new(),
        })
    }

    /// Tear down a session, stopping any live status polling.
    pub fn end_session(&mut self, session: &mut SessionState) {
        for handle in session.pollers.drain(..) {
            handle.abort();
        }
    }

    /// Process one utterance to completion. Always produces text.
    pub async fn handle_turn(
        &mut self,
        session: &mut SessionState,
        input: TurnInput<'_>,
    ) -> TurnResponse {
        let utterance = input.utterance.trim();
        let view = SessionView {
            reservation_pending: session.draft.is_some(),
            clarification_active: session.clarification.is_some(),
            has_memory: session.memory.is_some(),
        };
        let selected = intent::classify(utterance, &view, &self.rules);
        debug!(intent = ?selected, utterance, "turn");

        match selected {
            Intent::ReservationTurn => self.reservation_turn(session, utterance).await,
            Intent::ClarificationTurn => self.clarification_turn(session, utterance, input),
            Intent::FollowUp(follow_up) => self.follow_up(session, follow_up, input),
            Intent::StartReservation => self.start_reservation(session, utterance),
            Intent::FindDirect => {
                session.clarification = None;
                let ctx = context::extract(utterance);
                self.run_find(session, utterance, ctx, input)
            }
            Intent::FindNeedsClarification => {
                self.open_clarification(session, input, "Happy to dig something up. ")
            }
            Intent::NearMe => {
                let mut ctx = context::extract(utterance);
                ctx.near_only = true;
                self.run_find(session, utterance, ctx, input)
            }
            Intent::Indecision => {
                self.open_clarification(session, input, "No worries — let's narrow it down. ")
            }
            Intent::ChatRule(idx) => self.rule_response(idx, utterance),
            Intent::Fallback => self.fallback_response(utterance),
        }
    }

    /// Surface queued polling updates. Call between turns; messages land
    /// strictly after whatever the user said in the meantime.
    pub fn drain_notifications(&mut self) -> Vec<String> {
        let mut notes = Vec::new();

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                PollEvent::Observed { job_id, response } => {
                    let key = format!("{RESERVATION_STATUS_PREFIX}{job_id}");
                    let existing: Option<ReservationStatusRecord> =
                        store::get_json(self.store.as_ref(), &key).ok().flatten();

                    let record = ReservationStatusRecord {
                        job_id: job_id.clone(),
                        restaurant_name: existing
                            .as_ref()
                            .map(|r| r.restaurant_name.clone())
                            .filter(|n| !n.is_empty())
                            .unwrap_or_else(|| response.restaurant_name.clone()),
                        reservation_time: existing
                            .as_ref()
                            .map(|r| r.reservation_time.clone())
                            .filter(|t| !t.is_empty())
                            .unwrap_or_else(|| response.reservation_time.clone()),
                        party_size: existing
                            .as_ref()
                            .map(|r| r.party_size)
                            .filter(|p| *p > 0)
                            .unwrap_or(response.party_size),
                        status: response.status,
                        decision: response.reservation_decision,
                        updated_at: Utc::now(),
                        last_error: response.last_error.clone(),
                    };
                    self.put_status_record(&record);

                    if response.is_terminal() {
                        notes.push(terminal_message(&record));
                    }
                }
                PollEvent::PollFailed { job_id, reason } => {
                    let key = format!("{RESERVATION_STATUS_PREFIX}{job_id}");
                    if let Ok(Some(mut record)) =
                        store::get_json::<ReservationStatusRecord>(self.store.as_ref(), &key)
                    {
                        record.status = crate::reservation::service::CallStatus::Failed;
                        record.last_error = Some(reason.clone());
                        record.updated_at = Utc::now();
                        self.put_status_record(&record);
                    }
                    notes.push(format!(
                        "I lost track of that reservation call: {reason}. You may want to check with the restaurant directly."
                    ));
                }
            }
        }

        notes
    }

    // -----------------------------------------------------------------------
    // Reservation flow
    // -----------------------------------------------------------------------

    fn start_reservation(&mut self, session: &mut SessionState, utterance: &str) -> TurnResponse {
        // Reservation handling takes priority over an open clarification.
        session.clarification = None;

        match draft::from_utterance(utterance, &self.catalog) {
            Some(draft) => {
                let presented = draft::present(&draft);
                let text = match session.draft.replace(draft) {
                    Some(old) => format!(
                        "Dropping the {} request — let's do this one instead.\n\n{presented}",
                        old.restaurant_name
                    ),
                    None => presented,
                };
                TurnResponse::plain(text)
            }
            None => TurnResponse::plain(
                "Happy to call — which restaurant should I book? Give me the name and I'll draft it.",
            ),
        }
    }

    async fn reservation_turn(
        &mut self,
        session: &mut SessionState,
        utterance: &str,
    ) -> TurnResponse {
        let Some(mut draft) = session.draft.take() else {
            return self.fallback_response(utterance);
        };

        // A fresh reservation intent naming a different place wins over
        // the pending draft: cancel-and-restart, explicitly. Checked
        // before the confirm vocabulary so "book a table at X" never
        // reads as consent for the old draft.
        if intent::is_reservation_phrasing(utterance) {
            if let Some(new_draft) = draft::from_utterance(utterance, &self.catalog) {
                if new_draft.restaurant_name != draft.restaurant_name {
                    let dropped = draft.restaurant_name;
                    let text = format!(
                        "Dropping the {dropped} request — let's do this one instead.\n\n{}",
                        draft::present(&new_draft)
                    );
                    session.draft = Some(new_draft);
                    return TurnResponse::plain(text);
                }
            }
        }

        match draft::read_confirm_reply(utterance) {
            ConfirmReply::Affirmative => self.submit_draft(session, draft).await,
            ConfirmReply::Negative => TurnResponse::plain(
                "Okay, scrapped — nothing was sent. Say the word if you change your mind.",
            ),
            ConfirmReply::Other => {
                let changed = draft::apply_edit(&mut draft, utterance, &self.catalog);
                let text = if changed {
                    draft::present(&draft)
                } else {
                    format!(
                        "I didn't catch a change there.\n\n{}",
                        draft::present(&draft)
                    )
                };
                session.draft = Some(draft);
                TurnResponse::plain(text)
            }
        }
    }

    async fn submit_draft(
        &mut self,
        session: &mut SessionState,
        draft: ReservationDraft,
    ) -> TurnResponse {
        let request = draft.to_request();

        match self.service.start_call(&request).await {
            Ok(response) => {
                let record = ReservationStatusRecord {
                    job_id: response.job_id.clone(),
                    restaurant_name: draft.restaurant_name.clone(),
                    reservation_time: draft.reservation_time.clone(),
                    party_size: draft.party_size,
                    status: response.status,
                    decision: crate::reservation::service::ReservationDecision::Pending,
                    updated_at: Utc::now(),
                    last_error: None,
                };
                self.put_status_record(&record);

                let handle = spawn_poller(
                    self.service.clone(),
                    response.job_id.clone(),
                    self.poll_interval,
                    self.events_tx.clone(),
                );
                session.pollers.push(handle);

                info!(job_id = %response.job_id, restaurant = %draft.restaurant_name, "reservation call started");
                TurnResponse::plain(format!(
                    "Calling {} for a table for {} at {} — I'll let you know how it goes.",
                    draft.restaurant_name, draft.party_size, draft.reservation_time
                ))
            }
            Err(err) => {
                // Draft stays cleared so the user isn't stuck in a dead
                // confirm loop; they can restate to retry.
                warn!(error = %err, "reservation submission failed");
                TurnResponse::plain(format!(
                    "I couldn't start the call: {err}. The request wasn't sent — ask me again when you want to retry."
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Recommendation flow
    // -----------------------------------------------------------------------

    fn open_clarification(
        &mut self,
        session: &mut SessionState,
        input: TurnInput<'_>,
        intro: &str,
    ) -> TurnResponse {
        let state = ClarificationState::open(input.utterance.trim());
        match state.next_question() {
            Some(question) => {
                let text = format!("{intro}{question}");
                session.clarification = Some(state);
                TurnResponse::plain(text)
            }
            None => {
                // The opener already carried all four dimensions.
                let seed = state.seed_prompt.clone();
                let ctx = state.into_context();
                self.run_find(session, &seed, ctx, input)
            }
        }
    }

    fn clarification_turn(
        &mut self,
        session: &mut SessionState,
        utterance: &str,
        input: TurnInput<'_>,
    ) -> TurnResponse {
        let Some(mut state) = session.clarification.take() else {
            return self.fallback_response(utterance);
        };

        let filled = state.apply_reply(utterance);

        if state.is_complete() {
            debug!("clarification complete");
            let seed = state.seed_prompt.clone();
            let ctx = state.into_context();
            return self.run_find(session, &seed, ctx, input);
        }

        let question = state.next_question().unwrap_or("What are you in the mood for?");
        let text = if filled == 0 {
            format!("Didn't quite get that — {question}")
        } else {
            question.to_string()
        };
        session.clarification = Some(state);
        TurnResponse::plain(text)
    }

    fn follow_up(
        &mut self,
        session: &mut SessionState,
        follow_up: FollowUp,
        input: TurnInput<'_>,
    ) -> TurnResponse {
        let Some(memory) = session.memory.clone() else {
            return self.fallback_response(input.utterance);
        };

        match follow_up {
            FollowUp::Ordinal(n) => match memory.pick(n) {
                Some(place) => detail_response(place),
                None => {
                    // Out of range: fall back to a plain re-ranking of the
                    // remembered request.
                    debug!(ordinal = n, "follow-up out of range, re-ranking");
                    let seed = memory.seed_prompt.clone();
                    let ctx = context::extract(&seed);
                    self.run_find(session, &seed, ctx, input)
                }
            },
            FollowUp::Best => match memory.best() {
                Some(place) => detail_response(place),
                None => {
                    let seed = memory.seed_prompt.clone();
                    let ctx = context::extract(&seed);
                    self.run_find(session, &seed, ctx, input)
                }
            },
            FollowUp::Refine(kind) => {
                let refined = format!("{} {}", memory.seed_prompt, kind.qualifier());
                let ctx = context::extract(&refined);
                self.run_find(session, &refined, ctx, input)
            }
        }
    }

    fn run_find(
        &mut self,
        session: &mut SessionState,
        seed_prompt: &str,
        ctx: FindContext,
        input: TurnInput<'_>,
    ) -> TurnResponse {
        let base = geo::resolve_base(input.live_location, session.home.as_ref());
        let seed = fuzzy::utterance_seed(seed_prompt);

        match rank::rank(
            &self.catalog,
            &ctx,
            &session.profile,
            base,
            input.local_hour,
            seed,
        ) {
            RankOutcome::Ranked(picks) => {
                let kind = if ctx.vibe == Some(Vibe::Food) || ctx.meal.is_some() {
                    RecKind::Food
                } else {
                    RecKind::Find
                };
                session.memory = Some(RecommendationMemory::from_ranking(
                    kind,
                    seed_prompt,
                    &picks,
                    Some(base),
                ));
                shortlist_response(&picks, &ctx, seed_prompt)
            }
            RankOutcome::NoMatch { relax } => TurnResponse::plain(format!(
                "I couldn't find anything that fits all of that — the {relax} constraint is the one to loosen. Want me to try without it?"
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Rules and fallback
    // -----------------------------------------------------------------------

    fn rule_response(&self, idx: usize, utterance: &str) -> TurnResponse {
        let Some(rule) = self.rules.get(idx) else {
            return self.fallback_response(utterance);
        };

        match rule.flow {
            Some(FlowKind::ReservationStatus) => self.reservation_status_reply(),
            None => TurnResponse {
                text: self.rules.response_for(rule, utterance),
                navigation: rule.navigate.as_ref().map(|nav| NavSuggestion {
                    target_view: nav.target_view.clone(),
                    label: nav.label.clone(),
                }),
                actions: Vec::new(),
            },
        }
    }

    fn reservation_status_reply(&self) -> TurnResponse {
        let mut latest: Option<ReservationStatusRecord> = None;
        for key in self.store.keys_with_prefix(RESERVATION_STATUS_PREFIX) {
            if let Ok(Some(record)) =
                store::get_json::<ReservationStatusRecord>(self.store.as_ref(), &key)
            {
                let newer = latest
                    .as_ref()
                    .map_or(true, |l| record.updated_at > l.updated_at);
                if newer {
                    latest = Some(record);
                }
            }
        }

        match latest {
            None => TurnResponse::plain("No reservation calls on file yet — ask me to book a table and I'll make one."),
            Some(record) => TurnResponse::plain(status_message(&record)),
        }
    }

    fn fallback_response(&self, utterance: &str) -> TurnResponse {
        const FALLBACKS: &[&str] = &[
            "I didn't quite catch that. Ask me for somewhere to eat, something to do, or say \"book a table at …\".",
            "Not sure I follow — try \"find me coffee\", \"what's near me\", or \"book a table at Luigi's for 4 at 7pm\".",
            "Hmm, that one's past me. I'm good at food picks, things to do, and restaurant calls.",
        ];
        TurnResponse::plain(pick_variant(FALLBACKS, utterance))
    }

    fn put_status_record(&mut self, record: &ReservationStatusRecord) {
        let key = format!("{RESERVATION_STATUS_PREFIX}{}", record.job_id);
        match serde_json::to_string(record) {
            Ok(raw) => self.store.put(&key, raw),
            Err(err) => warn!(error = %err, "failed to encode status record"),
        }
    }
}

/// Deterministic phrasing pick, seeded from the utterance.
fn pick_variant(variants: &[&str], utterance: &str) -> String {
    let mut rng = StdRng::seed_from_u64(fuzzy::utterance_seed(utterance));
    variants
        .choose(&mut rng)
        .copied()
        .unwrap_or("Okay.")
        .to_string()
}

fn shortlist_response(picks: &[RankedPlace], ctx: &FindContext, seed_prompt: &str) -> TurnResponse {
    const INTROS: &[&str] = &[
        "Here's what I'd check out:",
        "A few spots worth a look:",
        "Try one of these:",
    ];

    let mut text = pick_variant(INTROS, seed_prompt);
    for (i, pick) in picks.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. {} — {}, {}, {:.1}★ ({:.1} km away)",
            i + 1,
            pick.place.name,
            pick.place.category,
            pick.place.price,
            pick.place.rating,
            pick.distance_km
        ));
    }
    text.push_str("\n\nSay a number for details, or \"cheaper\", \"closer\", \"another\".");

    let mut actions = Vec::new();
    if let Some(top) = picks.first() {
        let data = serde_json::json!({ "place_id": top.place.id });
        actions.push(ActionAffordance {
            kind: ActionKind::Pin,
            label: format!("Pin {}", top.place.name),
            data: Some(data.clone()),
        });
        actions.push(ActionAffordance {
            kind: ActionKind::Plan,
            label: format!("Add {} to a plan", top.place.name),
            data: Some(data.clone()),
        });
        if ctx.social == Some(Social::Group) {
            actions.push(ActionAffordance {
                kind: ActionKind::Jam,
                label: format!("Start a jam at {}", top.place.name),
                data: Some(data),
            });
        }
    }

    TurnResponse {
        text,
        navigation: None,
        actions,
    }
}

fn detail_response(place: &crate::catalog::Place) -> TurnResponse {
    let mut text = format!(
        "{} — {}, {}, {:.1}★\n{}",
        place.name, place.category, place.price, place.rating, place.description
    );
    if !place.duration_label.is_empty() {
        text.push_str(&format!("\nFigure about {}", place.duration_label));
        if !place.distance_label.is_empty() {
            text.push_str(&format!("; it's {} from campus.", place.distance_label));
        } else {
            text.push('.');
        }
    }

    let data = serde_json::json!({ "place_id": place.id });
    TurnResponse {
        text,
        navigation: None,
        actions: vec![
            ActionAffordance {
                kind: ActionKind::Pin,
                label: format!("Pin {}", place.name),
                data: Some(data.clone()),
            },
            ActionAffordance {
                kind: ActionKind::Plan,
                label: format!("Add {} to a plan", place.name),
                data: Some(data),
            },
        ],
    }
}

fn terminal_message(record: &ReservationStatusRecord) -> String {
    use crate::reservation::service::{CallStatus, ReservationDecision};

    match record.decision {
        ReservationDecision::Confirmed => format!(
            "Good news — {} confirmed a table for {} at {}.",
            record.restaurant_name, record.party_size, record.reservation_time
        ),
        ReservationDecision::Declined => format!(
            "{} couldn't take the reservation for {}. Want me to try somewhere else?",
            record.restaurant_name, record.reservation_time
        ),
        ReservationDecision::DeclinedTimeout => format!(
            "I couldn't get an answer from {} in time. Want to try another spot?",
            record.restaurant_name
        ),
        ReservationDecision::Pending => {
            let reason = record
                .last_error
                .clone()
                .unwrap_or_else(|| "the call failed".to_string());
            debug_assert_eq!(record.status, CallStatus::Failed);
            format!(
                "The call to {} didn't go through ({reason}). Want me to retry?",
                record.restaurant_name
            )
        }
    }
}

fn status_message(record: &ReservationStatusRecord) -> String {
    use crate::reservation::service::{CallStatus, ReservationDecision};

    let status_label = match record.status {
        CallStatus::Queued => "queued",
        CallStatus::Dialing => "dialing",
        CallStatus::InProgress => "in progress",
        CallStatus::Completed => "wrapping up",
        CallStatus::Failed => "failed",
    };

    match record.decision {
        ReservationDecision::Pending if record.status != CallStatus::Failed => format!(
            "Still working on {} — the call is {status_label} right now. I'll ping you when there's news.",
            record.restaurant_name
        ),
        _ => terminal_message(record),
    }
}
