//! Per-utterance intent selection.
//!
//! Pure: given the utterance and a view of the session, select exactly one
//! behavior. Pending flows are checked first so a mid-dialog answer is
//! never misrouted to generic chat; explicit reservation phrasing beats
//! recommendation phrasing; the declarative rule table comes last before
//! the catch-all.

use regex::Regex;

use crate::nlu::context;
use crate::nlu::fuzzy;
use crate::nlu::rules::RuleBook;

/// A referential follow-up against the remembered shortlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// 1-based pick number ("2", "option 3", "the second one").
    Ordinal(usize),
    /// "best one" / "top one".
    Best,
    /// Re-run the remembered request with a qualifier appended.
    Refine(RefineKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineKind {
    Cheaper,
    Closer,
    Another,
}

impl RefineKind {
    /// The qualifier appended to the remembered seed prompt.
    pub fn qualifier(&self) -> &'static str {
        match self {
            RefineKind::Cheaper => "cheaper",
            RefineKind::Closer => "closer",
            RefineKind::Another => "something different",
        }
    }
}

/// The behavior selected for one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// A reservation draft is pending; the reply belongs to that flow.
    ReservationTurn,
    /// A clarification session is open; the reply is an answer.
    ClarificationTurn,
    /// Referential follow-up on the remembered shortlist.
    FollowUp(FollowUp),
    /// Explicit reservation phrasing starts (or restarts) the draft flow.
    StartReservation,
    /// Recommendation request carrying enough structure to rank directly.
    FindDirect,
    /// Recommendation request too thin to rank; clarify first.
    FindNeedsClarification,
    /// "What's near me" against a base location.
    NearMe,
    /// "I don't know what to do": open-ended, clarify from nothing.
    Indecision,
    /// A declarative chat rule hit (index into the rule book).
    ChatRule(usize),
    /// Nothing matched; generic catch-all.
    Fallback,
}

/// What the classifier needs to know about the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionView {
    pub reservation_pending: bool,
    pub clarification_active: bool,
    pub has_memory: bool,
}

const RESERVATION_WORDS: &[&str] = &["book", "reserve", "reservation"];

const FIND_PHRASES: &[&str] = &[
    "find",
    "recommend",
    "suggest",
    "show me somewhere",
    "where should",
    "what should",
    "somewhere to",
    "something to do",
    "things to do",
    "any ideas",
    "ideas for",
];

const NEAR_ME_PHRASES: &[&str] = &["near me", "nearby", "close by", "around here", "what's around"];

/// Phrasings that ask about an existing booking rather than starting a
/// new one; routed to the rule table ahead of the reservation check.
const STATUS_INQUIRY_PHRASES: &[&str] = &[
    "how did",
    "status",
    "any news",
    "did the booking work",
    "did it work",
];

const INDECISION_PHRASES: &[&str] = &[
    "i don't know",
    "i dont know",
    "idk",
    "no idea",
    "bored",
    "i'm bored",
    "whatever",
    "anything",
    "surprise me",
];

/// Whether the utterance reads as an explicit reservation request.
pub fn is_reservation_phrasing(utterance: &str) -> bool {
    let tokens = fuzzy::tokenize(utterance);
    if RESERVATION_WORDS.iter().any(|w| fuzzy::word_matches(w, &tokens)) {
        return true;
    }
    // "a table at X" / "a table for 4" without a booking verb.
    Regex::new(r"(?i)\btable\s+(?:at|for)\b")
        .map(|re| re.is_match(utterance))
        .unwrap_or(false)
}

fn is_find_phrasing(utterance: &str) -> bool {
    let tokens = fuzzy::tokenize(utterance);
    FIND_PHRASES
        .iter()
        .any(|p| fuzzy::phrase_matches(p, &tokens))
}

fn is_near_me(utterance: &str) -> bool {
    let tokens = fuzzy::tokenize(utterance);
    NEAR_ME_PHRASES
        .iter()
        .any(|p| fuzzy::phrase_matches(p, &tokens))
}

fn is_indecision(utterance: &str) -> bool {
    let tokens = fuzzy::tokenize(utterance);
    INDECISION_PHRASES
        .iter()
        .any(|p| fuzzy::phrase_matches(p, &tokens))
}

fn is_status_inquiry(utterance: &str) -> bool {
    let tokens = fuzzy::tokenize(utterance);
    STATUS_INQUIRY_PHRASES
        .iter()
        .any(|p| fuzzy::phrase_matches(p, &tokens))
}

/// Parse a referential follow-up. Only meaningful when a shortlist is
/// remembered; the caller gates on that.
pub fn parse_follow_up(utterance: &str) -> Option<FollowUp> {
    let trimmed = utterance.trim();

    // Bare number: "2".
    if let Ok(n) = trimmed.parse::<usize>() {
        return Some(FollowUp::Ordinal(n));
    }

    // "option 3" / "number 3" / "pick 3".
    if let Some(caps) = Regex::new(r"(?i)\b(?:option|number|pick)\s+(\d+)\b")
        .ok()
        .and_then(|re| re.captures(trimmed))
    {
        if let Ok(n) = caps[1].parse::<usize>() {
            return Some(FollowUp::Ordinal(n));
        }
    }

    let lower = trimmed.to_lowercase();

    // Ordinal words.
    for (word, n) in [("first", 1), ("second", 2), ("third", 3), ("fourth", 4)] {
        if lower.contains(word) {
            return Some(FollowUp::Ordinal(n));
        }
    }

    if lower.contains("best one") || lower.contains("top one") || lower.contains("the best") {
        return Some(FollowUp::Best);
    }

    if lower.contains("cheaper") {
        return Some(FollowUp::Refine(RefineKind::Cheaper));
    }
    if lower.contains("closer") || lower.contains("nearer") {
        return Some(FollowUp::Refine(RefineKind::Closer));
    }
    if lower.contains("another") || lower.contains("something else") || lower.contains("different one")
    {
        return Some(FollowUp::Refine(RefineKind::Another));
    }

    None
}

/// Select exactly one behavior for the utterance. Pure; no side effects.
pub fn classify(utterance: &str, view: &SessionView, rules: &RuleBook) -> Intent {
    // Active flows first. Reservation wins when both would apply.
    if view.reservation_pending {
        return Intent::ReservationTurn;
    }

    if view.clarification_active {
        // Most-recent-intent wins: an utterance that stands on its own as
        // a reservation or a fully-specified request abandons the open
        // clarification. Bare vocabulary answers stay with it.
        if is_reservation_phrasing(utterance) {
            return Intent::StartReservation;
        }
        if is_find_phrasing(utterance) && context::extract(utterance).has_enough_structure() {
            return Intent::FindDirect;
        }
        return Intent::ClarificationTurn;
    }

    // Follow-ups resolve against the remembered shortlist, but an
    // explicit booking request is never a follow-up, whatever words it
    // happens to contain.
    if view.has_memory && !is_reservation_phrasing(utterance) {
        if let Some(follow_up) = parse_follow_up(utterance) {
            return Intent::FollowUp(follow_up);
        }
    }

    // "How did my reservation go" is about an existing booking, not a
    // new one; let the rule table answer it.
    if is_status_inquiry(utterance) {
        if let Some(idx) = rules.match_rule(utterance) {
            return Intent::ChatRule(idx);
        }
    }

    if is_reservation_phrasing(utterance) {
        return Intent::StartReservation;
    }

    if is_find_phrasing(utterance) {
        return if context::extract(utterance).has_enough_structure() {
            Intent::FindDirect
        } else {
            Intent::FindNeedsClarification
        };
    }

    if is_near_me(utterance) {
        return Intent::NearMe;
    }

    if is_indecision(utterance) {
        return Intent::Indecision;
    }

    // Utterances with real structure but no find verb ("cheap dinner
    // tonight") still read as recommendation requests.
    if context::extract(utterance).has_enough_structure() {
        return Intent::FindDirect;
    }

    if let Some(idx) = rules.match_rule(utterance) {
        return Intent::ChatRule(idx);
    }

    Intent::Fallback
}
