//! Reservation draft state machine: `none → drafted → (confirmed |
//! cancelled)`, with `drafted` re-entrant on edits.
//!
//! Field parsers are independent so a partial utterance still produces a
//! useful draft. Only the restaurant name is mandatory; without one the
//! flow stays in `none` and asks, rather than guessing a catalog entry.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::nlu::fuzzy;
use crate::reservation::service::{CallStatus, ReservationDecision, StartCallRequest};

/// Defaults presented in the draft when the utterance omitted a field;
/// the confirm loop exists so the user can correct them.
const DEFAULT_TIME: &str = "7:00 PM";
const DEFAULT_PARTY: u32 = 2;

/// An unsubmitted, user-editable reservation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub restaurant_name: String,
    pub reservation_time: String,
    pub party_size: u32,
    #[serde(default)]
    pub special_request: Option<String>,
}

impl ReservationDraft {
    pub fn to_request(&self) -> StartCallRequest {
        StartCallRequest {
            restaurant_name: self.restaurant_name.clone(),
            reservation_time: self.reservation_time.clone(),
            party_size: self.party_size,
            special_request: self.special_request.clone(),
        }
    }
}

/// Store log entry for one submitted call, keyed by job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusRecord {
    pub job_id: String,
    pub restaurant_name: String,
    pub reservation_time: String,
    pub party_size: u32,
    pub status: CallStatus,
    pub decision: ReservationDecision,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// How a reply reads while a draft is pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmReply {
    Affirmative,
    Negative,
    /// Neither; treated as an edit attempt.
    Other,
}

const AFFIRMATIVES: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "sure",
    "confirm",
    "book it",
    "go ahead",
    "do it",
    "sounds good",
    "call them",
];

const NEGATIVES: &[&str] = &[
    "no",
    "nope",
    "cancel",
    "nevermind",
    "never mind",
    "don't",
    "stop",
    "forget it",
];

/// Read a confirmation reply. Negatives are checked first so "no, don't"
/// never reads as consent.
pub fn read_confirm_reply(utterance: &str) -> ConfirmReply {
    let tokens = fuzzy::tokenize(utterance);

    if NEGATIVES.iter().any(|p| fuzzy::phrase_matches(p, &tokens)) {
        return ConfirmReply::Negative;
    }
    if AFFIRMATIVES
        .iter()
        .any(|p| fuzzy::phrase_matches(p, &tokens))
    {
        return ConfirmReply::Affirmative;
    }
    ConfirmReply::Other
}

/// Extract a restaurant name. Catalog names are tried first (tolerant
/// match), then an `at <Name>` capture. `None` means "ask, don't guess".
pub fn parse_restaurant_name(utterance: &str, catalog: &Catalog) -> Option<String> {
    let tokens = fuzzy::tokenize(utterance);

    for place in catalog.places() {
        if fuzzy::phrase_matches(&place.name, &tokens) {
            return Some(place.name.clone());
        }
    }

    let re = Regex::new(
        r"(?i)\bat\s+(?:the\s+)?([a-z][a-z'&\. -]{2,40}?)(?:\s+(?:for|at|on|tonight|tomorrow|this|around)\b|\s*[,.!?]|$)",
    )
    .ok()?;
    let caps = re.captures(utterance)?;
    let name = caps[1].trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Extract a clock time: `7pm`, `7:30 pm`, `noon`, `midnight`.
pub fn parse_time(utterance: &str) -> Option<String> {
    let lower = utterance.to_lowercase();
    if lower.contains("noon") {
        return Some("12:00 PM".to_string());
    }
    if lower.contains("midnight") {
        return Some("12:00 AM".to_string());
    }

    let re = Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").ok()?;
    let caps = re.captures(utterance)?;
    let hour: u32 = caps[1].parse().ok()?;
    if hour == 0 || hour > 12 {
        return None;
    }
    let minutes = caps.get(2).map(|m| m.as_str()).unwrap_or("00");
    let meridiem = caps[3].to_uppercase();
    Some(format!("{hour}:{minutes} {meridiem}"))
}

/// Extract a party size: `for 4`, `party of 4`, `table for four`.
pub fn parse_party_size(utterance: &str) -> Option<u32> {
    let re = Regex::new(r"(?i)\b(?:for|party of|table for|group of)\s+(\d{1,2})\b").ok()?;
    if let Some(caps) = re.captures(utterance) {
        return caps[1].parse().ok();
    }

    const WORDS: &[(&str, u32)] = &[
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
    ];
    let word_re =
        Regex::new(r"(?i)\b(?:for|party of|table for|group of)\s+([a-z]+)\b").ok()?;
    let caps = word_re.captures(utterance)?;
    let word = caps[1].to_lowercase();
    WORDS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

/// Extract a trailing special request: "… with a window table".
pub fn parse_special_request(utterance: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\b(?:with|mention|note that)\s+(.{3,80})$").ok()?;
    let caps = re.captures(utterance)?;
    let request = caps[1].trim().trim_end_matches(['.', '!']).to_string();

    // "with friends" is company, not a note to the restaurant.
    let tokens = fuzzy::tokenize(&request);
    if ["friends", "group", "date"]
        .iter()
        .any(|w| fuzzy::word_matches(w, &tokens))
    {
        return None;
    }
    Some(request)
}

/// Build a draft from a reservation-intent utterance. `None` when no
/// restaurant name could be extracted.
pub fn from_utterance(utterance: &str, catalog: &Catalog) -> Option<ReservationDraft> {
    let restaurant_name = parse_restaurant_name(utterance, catalog)?;
    Some(ReservationDraft {
        restaurant_name,
        reservation_time: parse_time(utterance).unwrap_or_else(|| DEFAULT_TIME.to_string()),
        party_size: parse_party_size(utterance).unwrap_or(DEFAULT_PARTY),
        special_request: parse_special_request(utterance),
    })
}

/// Apply whichever fields an edit reply parses to the draft. Returns
/// whether anything changed.
pub fn apply_edit(draft: &mut ReservationDraft, utterance: &str, catalog: &Catalog) -> bool {
    let mut changed = false;

    if let Some(name) = parse_restaurant_name(utterance, catalog) {
        if name != draft.restaurant_name {
            draft.restaurant_name = name;
            changed = true;
        }
    }
    if let Some(time) = parse_time(utterance) {
        if time != draft.reservation_time {
            draft.reservation_time = time;
            changed = true;
        }
    }
    if let Some(size) = parse_party_size(utterance) {
        if size != draft.party_size {
            draft.party_size = size;
            changed = true;
        }
    }
    if let Some(request) = parse_special_request(utterance) {
        if draft.special_request.as_deref() != Some(request.as_str()) {
            draft.special_request = Some(request);
            changed = true;
        }
    }

    changed
}

/// Render the draft for confirmation.
pub fn present(draft: &ReservationDraft) -> String {
    let mut text = format!(
        "Here's the reservation request:\n• Place: {}\n• Time: {}\n• Party: {}",
        draft.restaurant_name, draft.reservation_time, draft.party_size
    );
    if let Some(request) = &draft.special_request {
        text.push_str(&format!("\n• Note: {request}"));
    }
    text.push_str("\n\nShall I call them? (yes to send, no to cancel, or tell me what to change)");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json_str(include_str!("../../config/catalog.sample.json")).unwrap()
    }

    #[test]
    fn test_full_draft_round_trip() {
        let draft =
            from_utterance("book a table at Luigi's Trattoria for 4 at 7pm", &catalog())
                .unwrap();
        assert_eq!(draft.restaurant_name, "Luigi's Trattoria");
        assert_eq!(draft.party_size, 4);
        assert_eq!(draft.reservation_time, "7:00 PM");
        assert_eq!(draft.special_request, None);
    }

    #[test]
    fn test_catalog_name_matches_with_typo() {
        let draft = from_utterance("reserve luigis tratoria for two", &catalog()).unwrap();
        assert_eq!(draft.restaurant_name, "Luigi's Trattoria");
        assert_eq!(draft.party_size, 2);
    }

    #[test]
    fn test_off_catalog_name_via_at_capture() {
        let draft =
            from_utterance("book a table at Rosa's Cantina for 3 at 8:30pm", &catalog())
                .unwrap();
        assert_eq!(draft.restaurant_name, "Rosa's Cantina");
        assert_eq!(draft.reservation_time, "8:30 PM");
        assert_eq!(draft.party_size, 3);
    }

    #[test]
    fn test_missing_name_yields_no_draft() {
        assert!(from_utterance("book a table for 4 at 7pm", &catalog()).is_none());
        assert!(from_utterance("make a reservation", &catalog()).is_none());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let draft = from_utterance("book Luigi's Trattoria", &catalog()).unwrap();
        assert_eq!(draft.reservation_time, DEFAULT_TIME);
        assert_eq!(draft.party_size, DEFAULT_PARTY);
    }

    #[test]
    fn test_special_request_captured() {
        let draft = from_utterance(
            "book a table at Luigi's Trattoria for 2 with a window table",
            &catalog(),
        )
        .unwrap();
        assert_eq!(draft.special_request.as_deref(), Some("a window table"));
    }

    #[test]
    fn test_edit_updates_only_parsed_fields() {
        let mut draft =
            from_utterance("book Luigi's Trattoria for 4 at 7pm", &catalog()).unwrap();
        assert!(apply_edit(&mut draft, "make it 6 people at 8pm", &catalog()));
        // "make it 6 people" has no for/party-of marker; size via "for".
        assert_eq!(draft.reservation_time, "8:00 PM");

        assert!(apply_edit(&mut draft, "actually for 6", &catalog()));
        assert_eq!(draft.party_size, 6);
        assert_eq!(draft.restaurant_name, "Luigi's Trattoria");
    }

    #[test]
    fn test_confirm_replies() {
        assert_eq!(read_confirm_reply("yes please"), ConfirmReply::Affirmative);
        assert_eq!(read_confirm_reply("book it"), ConfirmReply::Affirmative);
        assert_eq!(read_confirm_reply("no, don't"), ConfirmReply::Negative);
        assert_eq!(read_confirm_reply("cancel that"), ConfirmReply::Negative);
        assert_eq!(read_confirm_reply("make it 8pm"), ConfirmReply::Other);
    }

    #[test]
    fn test_time_parsing_variants() {
        assert_eq!(parse_time("at 7pm").as_deref(), Some("7:00 PM"));
        assert_eq!(parse_time("7:45 am works").as_deref(), Some("7:45 AM"));
        assert_eq!(parse_time("around noon").as_deref(), Some("12:00 PM"));
        assert_eq!(parse_time("sometime"), None);
    }
}
