//! Recommendation memory: the single-slot record of the last surfaced
//! shortlist, used to resolve "the second one" / "cheaper" follow-ups.
//!
//! A new recommendation request always replaces the whole slot; picks
//! are never merged or appended.

use chrono::{DateTime, Utc};

use crate::catalog::Place;
use crate::geo::GeoPoint;
use crate::rank::RankedPlace;

/// What kind of request produced the shortlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecKind {
    Find,
    Food,
}

/// The last recommendation set.
#[derive(Debug, Clone)]
pub struct RecommendationMemory {
    pub kind: RecKind,
    pub seed_prompt: String,
    pub picks: Vec<Place>,
    pub base_location: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
}

impl RecommendationMemory {
    pub fn from_ranking(
        kind: RecKind,
        seed_prompt: &str,
        picks: &[RankedPlace],
        base_location: Option<GeoPoint>,
    ) -> Self {
        Self {
            kind,
            seed_prompt: seed_prompt.to_string(),
            picks: picks.iter().map(|r| r.place.clone()).collect(),
            base_location,
            updated_at: Utc::now(),
        }
    }

    /// Resolve a 1-based ordinal against the picks. Out-of-range is
    /// `None`; the caller falls back to a fresh ranking, never an error.
    pub fn pick(&self, ordinal: usize) -> Option<&Place> {
        if ordinal == 0 {
            return None;
        }
        self.picks.get(ordinal - 1)
    }

    pub fn best(&self) -> Option<&Place> {
        self.picks.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, PriceTier};

    fn place(id: &str) -> Place {
        Place {
            id: id.to_string(),
            name: id.to_string(),
            category: Category::Cafe,
            subcategory: None,
            tags: vec![],
            features: vec![],
            price: PriceTier::Budget,
            rating: 4.0,
            location: GeoPoint {
                lat: 44.56,
                lng: -123.27,
            },
            distance_label: String::new(),
            duration_label: String::new(),
            description: String::new(),
        }
    }

    fn memory_with(ids: &[&str]) -> RecommendationMemory {
        RecommendationMemory {
            kind: RecKind::Find,
            seed_prompt: "something fun".to_string(),
            picks: ids.iter().map(|id| place(id)).collect(),
            base_location: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ordinal_resolution() {
        let memory = memory_with(&["a", "b", "c"]);
        assert_eq!(memory.pick(2).unwrap().id, "b");
        assert_eq!(memory.best().unwrap().id, "a");
    }

    #[test]
    fn test_out_of_range_and_zero_are_none() {
        let memory = memory_with(&["a", "b", "c"]);
        assert!(memory.pick(6).is_none());
        assert!(memory.pick(0).is_none());
    }

    #[test]
    fn test_empty_picks() {
        let memory = memory_with(&[]);
        assert!(memory.pick(1).is_none());
        assert!(memory.best().is_none());
    }
}
