//! Natural-language heuristics: tolerant phrase matching, context
//! extraction, intent selection, and the declarative chat rule table.
//!
//! Everything here is token/phrase-level by design: no semantic search,
//! no embeddings. The matchers are pure functions so they can be tested
//! without a session.

pub mod context;
pub mod fuzzy;
pub mod intent;
pub mod rules;

pub use context::{extract, FindContext};
pub use intent::{classify, FollowUp, Intent, RefineKind, SessionView};
pub use rules::{ChatRule, FlowKind, RuleBook};
