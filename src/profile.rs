//! Preference profile reader.
//!
//! The training UI elsewhere in the app writes like/dislike signals against
//! a fixed set of taste prompts; this module only reads them back and
//! derives the flags the scorer needs. The engine never mutates the
//! profile.

use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::store::{self, KeyValueStore, PREFS_DISLIKED_KEY, PREFS_LIKED_KEY};

/// The fixed taste-training prompt ids. Completeness is measured against
/// this set; unknown ids in the store are carried but don't count.
pub const TRAINING_PROMPTS: [&str; 10] = [
    "sunrise_hike",
    "live_music_night",
    "street_food_crawl",
    "museum_afternoon",
    "coffee_shop_study",
    "beach_day",
    "cheap_eats",
    "fancy_dinner_out",
    "bike_loop",
    "quiet_park_reading",
];

/// A user's accumulated like/dislike signal.
#[derive(Debug, Clone, Default)]
pub struct PreferenceProfile {
    liked: BTreeSet<String>,
    disliked: BTreeSet<String>,
}

impl PreferenceProfile {
    pub fn new(liked: BTreeSet<String>, disliked: BTreeSet<String>) -> Self {
        Self { liked, disliked }
    }

    /// Read the profile from persisted state. Missing keys mean an
    /// untrained profile, not an error.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        let liked: Vec<String> = store::get_json(store, PREFS_LIKED_KEY)?.unwrap_or_default();
        let disliked: Vec<String> = store::get_json(store, PREFS_DISLIKED_KEY)?.unwrap_or_default();
        Ok(Self {
            liked: liked.into_iter().collect(),
            disliked: disliked.into_iter().collect(),
        })
    }

    pub fn likes(&self, prompt: &str) -> bool {
        self.liked.contains(prompt)
    }

    pub fn dislikes(&self, prompt: &str) -> bool {
        self.disliked.contains(prompt)
    }

    pub fn liked_prompts(&self) -> impl Iterator<Item = &str> {
        self.liked.iter().map(String::as_str)
    }

    pub fn disliked_prompts(&self) -> impl Iterator<Item = &str> {
        self.disliked.iter().map(String::as_str)
    }

    /// Whether any training signal exists at all.
    pub fn has_training_data(&self) -> bool {
        !self.liked.is_empty() || !self.disliked.is_empty()
    }

    /// Fraction of the fixed prompt set with an answer, in `0.0..=1.0`.
    pub fn completeness(&self) -> f32 {
        let answered = TRAINING_PROMPTS
            .iter()
            .filter(|p| self.likes(p) || self.dislikes(p))
            .count();
        answered as f32 / TRAINING_PROMPTS.len() as f32
    }

    /// Leans toward cheap plates and food carts.
    pub fn prefers_budget(&self) -> bool {
        self.likes("cheap_eats")
    }

    /// Will pay for the tasting menu.
    pub fn prefers_splurge(&self) -> bool {
        self.likes("fancy_dinner_out")
    }

    /// Gets around under their own power.
    pub fn prefers_pedal(&self) -> bool {
        self.likes("bike_loop")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_empty_store_is_untrained() {
        let store = MemoryStore::new();
        let profile = PreferenceProfile::load(&store).unwrap();
        assert!(!profile.has_training_data());
        assert_eq!(profile.completeness(), 0.0);
    }

    #[test]
    fn test_load_and_flags() {
        let mut store = MemoryStore::new();
        store.put(
            PREFS_LIKED_KEY,
            r#"["cheap_eats","beach_day"]"#.to_string(),
        );
        store.put(PREFS_DISLIKED_KEY, r#"["museum_afternoon"]"#.to_string());

        let profile = PreferenceProfile::load(&store).unwrap();
        assert!(profile.has_training_data());
        assert!(profile.prefers_budget());
        assert!(!profile.prefers_splurge());
        assert!(profile.dislikes("museum_afternoon"));
        assert!((profile.completeness() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_prompt_does_not_count_toward_completeness() {
        let liked: BTreeSet<String> = ["mystery_prompt".to_string()].into_iter().collect();
        let profile = PreferenceProfile::new(liked, BTreeSet::new());
        assert!(profile.has_training_data());
        assert_eq!(profile.completeness(), 0.0);
    }
}
