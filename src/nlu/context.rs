//! Context extraction: map an utterance onto the structured, partially
//! filled filter the ranker consumes.
//!
//! Each field has its own keyword family; families are evaluated in a
//! fixed order and are independent of each other. The first variant whose
//! vocabulary appears wins the field; nothing ever defaults. Extraction
//! never fails; an unmatched field is simply absent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vibe {
    Outdoor,
    Indoor,
    Food,
    Mix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Free,
    Cheap,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Social {
    Solo,
    Date,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Now,
    Quick,
    Tonight,
    Weekend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Sunny,
    Rainy,
    Windy,
    Hot,
    Cold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Meal {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    LateNight,
    Coffee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HikeLength {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Chill,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Walk,
    Bike,
    Bus,
    Car,
}

/// Per-utterance filter. Absence of a field means "unconstrained", never
/// "excluded". Constructed fresh each turn; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindContext {
    pub vibe: Option<Vibe>,
    pub budget: Option<Budget>,
    pub social: Option<Social>,
    pub timing: Option<Timing>,
    pub weather: Option<Weather>,
    pub meal: Option<Meal>,
    pub hike_length: Option<HikeLength>,
    pub effort: Option<Effort>,
    pub transport: Option<Transport>,
    pub wants_swim: bool,
    pub wants_tan: bool,
    pub near_only: bool,
}

impl FindContext {
    /// Whether the utterance carried enough structure to skip
    /// clarification: any single field is sufficient.
    pub fn has_enough_structure(&self) -> bool {
        self.vibe.is_some()
            || self.budget.is_some()
            || self.social.is_some()
            || self.timing.is_some()
            || self.weather.is_some()
            || self.meal.is_some()
            || self.hike_length.is_some()
            || self.effort.is_some()
            || self.transport.is_some()
            || self.wants_swim
            || self.wants_tan
            || self.near_only
    }
}

/// Does the normalized utterance contain `needle` as a whole-word phrase?
/// Padding both sides turns word boundaries into plain substring checks.
fn has_phrase(normalized: &str, needle: &str) -> bool {
    let padded = format!(" {} ", normalized.replace('-', " "));
    let target = format!(" {} ", needle.replace('-', " "));
    padded.contains(&target)
}

fn first_match<T: Copy>(normalized: &str, families: &[(T, &[&str])]) -> Option<T> {
    for (value, vocab) in families {
        if vocab.iter().any(|kw| has_phrase(normalized, kw)) {
            return Some(*value);
        }
    }
    None
}

/// Extract a [`FindContext`] from free text. Fields are evaluated in a
/// fixed order; within a family the first matching variant wins.
pub fn extract(utterance: &str) -> FindContext {
    let normalized: String = utterance
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' || c == '-' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let vibe = first_match(
        &normalized,
        &[
            (
                Vibe::Outdoor,
                &[
                    "outside", "outdoor", "outdoors", "nature", "fresh air", "trail", "hike",
                    "hiking",
                ][..],
            ),
            (Vibe::Indoor, &["inside", "indoor", "indoors", "cozy"][..]),
            (
                Vibe::Food,
                &[
                    "food", "eat", "hungry", "restaurant", "dinner", "lunch", "brunch",
                    "breakfast", "snack", "tacos",
                ][..],
            ),
            (Vibe::Mix, &["mix", "bit of everything", "little of both"][..]),
        ],
    );

    let budget = first_match(
        &normalized,
        &[
            (Budget::Free, &["free", "no money", "broke", "zero budget"][..]),
            (
                Budget::Cheap,
                &["cheap", "cheaper", "budget", "affordable", "inexpensive"][..],
            ),
            (
                Budget::Flexible,
                &["splurge", "fancy", "treat myself", "any budget", "flexible"][..],
            ),
        ],
    );

    let social = first_match(
        &normalized,
        &[
            (Social::Date, &["date", "romantic", "anniversary", "partner"][..]),
            (
                Social::Group,
                &["friends", "group", "crew", "squad", "roommates", "everyone"][..],
            ),
            (Social::Solo, &["alone", "solo", "by myself", "just me", "me time"][..]),
        ],
    );

    let timing = first_match(
        &normalized,
        &[
            (Timing::Tonight, &["tonight", "this evening"][..]),
            (Timing::Weekend, &["weekend", "saturday", "sunday"][..]),
            (
                Timing::Quick,
                &["quick", "short on time", "an hour", "between classes"][..],
            ),
            (Timing::Now, &["right now", "now", "asap", "immediately"][..]),
        ],
    );

    let weather = first_match(
        &normalized,
        &[
            (Weather::Rainy, &["rain", "rainy", "raining", "drizzle", "pouring"][..]),
            (Weather::Windy, &["windy", "wind"][..]),
            (Weather::Hot, &["hot", "heat", "scorching", "sweltering"][..]),
            (Weather::Cold, &["cold", "freezing", "chilly"][..]),
            (Weather::Sunny, &["sunny", "sun is out", "clear skies"][..]),
        ],
    );

    let meal = first_match(
        &normalized,
        &[
            (Meal::Brunch, &["brunch"][..]),
            (Meal::Breakfast, &["breakfast"][..]),
            (Meal::LateNight, &["late night", "late-night", "midnight"][..]),
            (Meal::Lunch, &["lunch"][..]),
            (Meal::Dinner, &["dinner"][..]),
            (Meal::Coffee, &["coffee", "latte", "espresso", "caffeine"][..]),
        ],
    );

    let hike_length = first_match(
        &normalized,
        &[
            (
                HikeLength::Short,
                &["short hike", "quick hike", "easy hike", "small hike"][..],
            ),
            (
                HikeLength::Long,
                &["long hike", "big hike", "all day hike", "long trail"][..],
            ),
        ],
    );

    let effort = first_match(
        &normalized,
        &[
            (
                Effort::Chill,
                &["chill", "relax", "relaxing", "lazy", "low key", "low-key"][..],
            ),
            (
                Effort::Active,
                &["active", "workout", "exercise", "energetic", "burn off"][..],
            ),
        ],
    );

    let transport = first_match(
        &normalized,
        &[
            (Transport::Walk, &["walk", "walking", "on foot"][..]),
            (Transport::Bike, &["bike", "biking", "cycle", "cycling"][..]),
            (Transport::Bus, &["bus", "transit"][..]),
            (Transport::Car, &["car", "drive", "driving"][..]),
        ],
    );

    let wants_swim = ["swim", "swimming", "take a dip"]
        .iter()
        .any(|kw| has_phrase(&normalized, kw));
    let wants_tan = ["tan", "tanning", "sunbathe", "lay in the sun"]
        .iter()
        .any(|kw| has_phrase(&normalized, kw));
    let near_only = ["near me", "nearby", "close by", "closer", "around here", "walkable"]
        .iter()
        .any(|kw| has_phrase(&normalized, kw));

    FindContext {
        vibe,
        budget,
        social,
        timing,
        weather,
        meal,
        hike_length,
        effort,
        transport,
        wants_swim,
        wants_tan,
        near_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_utterance_is_unconstrained() {
        let ctx = extract("ok then");
        assert_eq!(ctx, FindContext::default());
        assert!(!ctx.has_enough_structure());
    }

    #[test]
    fn test_single_fields() {
        assert_eq!(extract("something outdoors").vibe, Some(Vibe::Outdoor));
        assert_eq!(extract("keep it cheap").budget, Some(Budget::Cheap));
        assert_eq!(extract("date night ideas").social, Some(Social::Date));
        assert_eq!(extract("what about tonight").timing, Some(Timing::Tonight));
        assert_eq!(extract("it's raining").weather, Some(Weather::Rainy));
        assert_eq!(extract("i need coffee").meal, Some(Meal::Coffee));
        assert_eq!(
            extract("a short hike maybe").hike_length,
            Some(HikeLength::Short)
        );
        assert_eq!(extract("something chill").effort, Some(Effort::Chill));
        assert_eq!(extract("i only have my bike").transport, Some(Transport::Bike));
    }

    #[test]
    fn test_booleans() {
        let ctx = extract("somewhere to swim and tan near me");
        assert!(ctx.wants_swim);
        assert!(ctx.wants_tan);
        assert!(ctx.near_only);
    }

    #[test]
    fn test_first_variant_wins_within_family() {
        // "tonight" is checked before "now" so the more specific phrase wins.
        let ctx = extract("dinner tonight right now");
        assert_eq!(ctx.timing, Some(Timing::Tonight));
    }

    #[test]
    fn test_compound_request() {
        let ctx = extract("cheap dinner with friends tonight, walking distance");
        assert_eq!(ctx.budget, Some(Budget::Cheap));
        assert_eq!(ctx.meal, Some(Meal::Dinner));
        assert_eq!(ctx.social, Some(Social::Group));
        assert_eq!(ctx.timing, Some(Timing::Tonight));
        assert_eq!(ctx.vibe, Some(Vibe::Food));
        assert_eq!(ctx.transport, Some(Transport::Walk));
        assert!(ctx.has_enough_structure());
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "hotel" must not read as hot, "carpet" must not read as car.
        let ctx = extract("the hotel carpet");
        assert_eq!(ctx.weather, None);
        assert_eq!(ctx.transport, None);
    }
}
