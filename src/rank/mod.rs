//! Ranking layer: the preference scorer and the candidate ranker that
//! turns a context plus the catalog into an ordered shortlist.

pub mod ranker;
pub mod scorer;

pub use ranker::{rank, RankOutcome, RankedPlace};
pub use scorer::score;
