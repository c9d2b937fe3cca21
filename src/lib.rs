//! Townie assistant engine.
//!
//! The conversational core behind the Townie app's assistant: it turns a
//! free-text request into a ranked shortlist of catalog places, asks
//! clarifying questions when the request is too thin, remembers the last
//! shortlist so "the second one" and "cheaper" work, and runs the
//! confirm/edit dialog that hands a reservation request to the external
//! calling service.
//!
//! # Architecture
//!
//! ```text
//! utterance ──► Intent Classifier ──► Clarification ─┐
//!                    │        │                      │
//!                    │        └──► Reservation Flow ─┼──► TurnResponse
//!                    │                               │
//!                    └──► Context Extractor ──► Ranker (Scorer + Catalog)
//!                                                │
//!                                  Recommendation Memory (follow-ups)
//! ```
//!
//! Everything is session-scoped and single-writer: the caller owns a
//! [`SessionState`] and threads it through [`Engine::handle_turn`]. The
//! only background work is reservation-status polling, drained between
//! turns via [`Engine::drain_notifications`].

pub mod catalog;
pub mod dialog;
pub mod error;
pub mod geo;
pub mod nlu;
pub mod profile;
pub mod rank;
pub mod reservation;
pub mod store;

pub use catalog::{Catalog, Category, Place, PriceTier};
pub use dialog::{
    ActionAffordance, ActionKind, Engine, NavSuggestion, SessionState, TurnInput, TurnResponse,
};
pub use error::EngineError;
pub use geo::{GeoPoint, HomeLocation};
pub use profile::PreferenceProfile;
pub use reservation::{
    HttpReservationService, ReservationService, StaticReservationService,
};
pub use store::{KeyValueStore, MemoryStore};
