//! Preference affinity scoring.
//!
//! `score(place, profile)` is a pure function of its arguments, with no
//! session state, so the ranker can recompute it per candidate cheaply. Without
//! training data the score degrades to a monotonic function of rating.

use crate::catalog::{Category, Place, PriceTier};
use crate::profile::PreferenceProfile;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Untrained fallback: `1.5 + 1.3 × rating`, clamped to 1..10.
const UNTRAINED_BASE: f32 = 1.5;
const UNTRAINED_RATING_WEIGHT: f32 = 1.3;

/// Trained scores start here and move by boosts/penalties.
const TRAINED_BASELINE: f32 = 5.0;

/// Boost when a liked prompt's affinity covers the place's category.
const CATEGORY_BOOST: f32 = 2.0;

/// Boost when a liked prompt's affinity covers one of the place's features.
const FEATURE_BOOST: f32 = 1.0;

/// Boost per affinity tag fragment found in the place's tags.
const TAG_BOOST: f32 = 0.5;

/// Bonus for budget/splurge/pedal preference flags lining up. Bonuses
/// only; a mismatch is neutral, not a penalty.
const FLAG_BONUS: f32 = 0.5;

/// Rating-centred adjustment: `(rating − 2.5) × 0.4`.
const RATING_CENTER: f32 = 2.5;
const RATING_WEIGHT: f32 = 0.4;

const SCORE_MIN: f32 = 1.0;
const SCORE_MAX: f32 = 10.0;

// ---------------------------------------------------------------------------
// Prompt affinity table
// ---------------------------------------------------------------------------

/// How a training prompt maps onto catalog entries.
struct PromptAffinity {
    prompt: &'static str,
    categories: &'static [Category],
    features: &'static [&'static str],
    tag_fragments: &'static [&'static str],
}

const AFFINITIES: &[PromptAffinity] = &[
    PromptAffinity {
        prompt: "sunrise_hike",
        categories: &[Category::Hike, Category::Viewpoint],
        features: &["sunrise-views"],
        tag_fragments: &["trail", "summit"],
    },
    PromptAffinity {
        prompt: "live_music_night",
        categories: &[Category::LiveMusic, Category::Bar],
        features: &["live-music"],
        tag_fragments: &["music", "gig"],
    },
    PromptAffinity {
        prompt: "street_food_crawl",
        categories: &[Category::Market, Category::Restaurant],
        features: &[],
        tag_fragments: &["street-food", "food-cart"],
    },
    PromptAffinity {
        prompt: "museum_afternoon",
        categories: &[Category::Museum],
        features: &[],
        tag_fragments: &["art", "history"],
    },
    PromptAffinity {
        prompt: "coffee_shop_study",
        categories: &[Category::Cafe, Category::StudySpot],
        features: &["wifi"],
        tag_fragments: &["coffee", "quiet"],
    },
    PromptAffinity {
        prompt: "beach_day",
        categories: &[Category::Beach],
        features: &["swimming"],
        tag_fragments: &["sand", "swim"],
    },
    PromptAffinity {
        prompt: "cheap_eats",
        categories: &[Category::Restaurant, Category::Market],
        features: &[],
        tag_fragments: &["cheap", "street-food"],
    },
    PromptAffinity {
        prompt: "fancy_dinner_out",
        categories: &[Category::Restaurant],
        features: &["reservations"],
        tag_fragments: &["fine-dining", "upscale"],
    },
    PromptAffinity {
        prompt: "bike_loop",
        categories: &[Category::Hike, Category::Park],
        features: &["bike-friendly"],
        tag_fragments: &["cycling", "loop"],
    },
    PromptAffinity {
        prompt: "quiet_park_reading",
        categories: &[Category::Park],
        features: &[],
        tag_fragments: &["quiet", "shade"],
    },
];

fn affinity_for(prompt: &str) -> Option<&'static PromptAffinity> {
    AFFINITIES.iter().find(|a| a.prompt == prompt)
}

/// Signed contribution of one prompt to one place; `sign` is +1 for a
/// like, −1 for a dislike.
fn prompt_delta(place: &Place, affinity: &PromptAffinity, sign: f32) -> f32 {
    let mut delta = 0.0;

    if affinity.categories.contains(&place.category) {
        delta += CATEGORY_BOOST;
    }
    if affinity.features.iter().any(|f| place.has_feature(f)) {
        delta += FEATURE_BOOST;
    }
    for fragment in affinity.tag_fragments {
        if place.has_tag_containing(fragment) {
            delta += TAG_BOOST;
        }
    }

    delta * sign
}

/// Affinity score in 1..=10.
pub fn score(place: &Place, profile: &PreferenceProfile) -> u8 {
    let raw = if profile.has_training_data() {
        trained_score(place, profile)
    } else {
        UNTRAINED_BASE + UNTRAINED_RATING_WEIGHT * place.rating
    };

    raw.clamp(SCORE_MIN, SCORE_MAX).round() as u8
}

fn trained_score(place: &Place, profile: &PreferenceProfile) -> f32 {
    let mut raw = TRAINED_BASELINE;

    for prompt in profile.liked_prompts() {
        if let Some(affinity) = affinity_for(prompt) {
            raw += prompt_delta(place, affinity, 1.0);
        }
    }
    for prompt in profile.disliked_prompts() {
        if let Some(affinity) = affinity_for(prompt) {
            raw += prompt_delta(place, affinity, -1.0);
        }
    }

    if profile.prefers_budget() && place.price <= PriceTier::Budget {
        raw += FLAG_BONUS;
    }
    if profile.prefers_splurge() && place.price == PriceTier::Splurge {
        raw += FLAG_BONUS;
    }
    if profile.prefers_pedal() && place.has_feature("bike-friendly") {
        raw += FLAG_BONUS;
    }

    raw + (place.rating - RATING_CENTER) * RATING_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use std::collections::BTreeSet;

    fn place(category: Category, rating: f32) -> Place {
        Place {
            id: "p".to_string(),
            name: "P".to_string(),
            category,
            subcategory: None,
            tags: vec![],
            features: vec![],
            price: PriceTier::Budget,
            rating,
            location: GeoPoint {
                lat: 44.56,
                lng: -123.27,
            },
            distance_label: String::new(),
            duration_label: String::new(),
            description: String::new(),
        }
    }

    fn profile_liking(prompts: &[&str]) -> PreferenceProfile {
        let liked: BTreeSet<String> = prompts.iter().map(|p| p.to_string()).collect();
        PreferenceProfile::new(liked, BTreeSet::new())
    }

    #[test]
    fn test_untrained_score_monotonic_in_rating() {
        let profile = PreferenceProfile::default();
        let mut last = 0;
        for tenths in 0..=50 {
            let rating = tenths as f32 / 10.0;
            let s = score(&place(Category::Cafe, rating), &profile);
            assert!(s >= last, "rating {rating} scored {s} below {last}");
            assert!((1..=10).contains(&s));
            last = s;
        }
    }

    #[test]
    fn test_liked_category_never_scores_below_untrained_baseline() {
        // Liking a prompt that boosts a category must not hurt any place
        // in that category, at any rating.
        let untrained = PreferenceProfile::default();
        let trained = profile_liking(&["museum_afternoon"]);
        for tenths in 0..=50 {
            let rating = tenths as f32 / 10.0;
            let p = place(Category::Museum, rating);
            assert!(
                score(&p, &trained) >= score(&p, &untrained),
                "rating {rating}"
            );
        }
    }

    #[test]
    fn test_dislike_pulls_score_down() {
        let p = place(Category::Museum, 4.0);
        let liking = profile_liking(&["museum_afternoon"]);
        let disliking = PreferenceProfile::new(
            BTreeSet::new(),
            ["museum_afternoon".to_string()].into_iter().collect(),
        );
        assert!(score(&p, &disliking) < score(&p, &liking));
    }

    #[test]
    fn test_feature_and_tag_boosts_stack() {
        let mut p = place(Category::Cafe, 4.0);
        let profile = profile_liking(&["coffee_shop_study"]);
        let base = score(&p, &profile);

        p.features = vec!["wifi".to_string()];
        p.tags = vec!["coffee".to_string(), "quiet".to_string()];
        assert!(score(&p, &profile) > base);
    }

    #[test]
    fn test_budget_flag_bonus() {
        let cheap = place(Category::Restaurant, 3.5); // Budget tier
        let mut dear = place(Category::Restaurant, 3.5);
        dear.price = PriceTier::Splurge;

        let profile = profile_liking(&["cheap_eats"]);
        assert!(score(&cheap, &profile) > score(&dear, &profile));
    }

    #[test]
    fn test_score_bounds() {
        let everything: Vec<&str> = crate::profile::TRAINING_PROMPTS.to_vec();
        let profile = profile_liking(&everything);
        let mut p = place(Category::Restaurant, 5.0);
        p.features = vec!["reservations".to_string(), "bike-friendly".to_string()];
        p.tags = vec!["cheap".to_string(), "street-food".to_string()];
        assert_eq!(score(&p, &profile), 10);

        let hater = PreferenceProfile::new(
            BTreeSet::new(),
            crate::profile::TRAINING_PROMPTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let mut low = place(Category::Museum, 0.5);
        low.tags = vec![
            "quiet".to_string(),
            "coffee".to_string(),
            "art".to_string(),
            "history".to_string(),
        ];
        assert_eq!(score(&low, &hater), 1);
    }
}
