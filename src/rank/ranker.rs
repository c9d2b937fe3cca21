//! Candidate ranking: hard constraint filters, then a weighted soft score.
//!
//! Hard filters run in a fixed order and remember which dimension emptied
//! the candidate pool, so an over-constrained request gets an honest
//! "loosen this" answer instead of a silently broadened search. The ranker
//! never relaxes a constraint on its own.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;

use crate::catalog::{Catalog, Category, Place, PriceTier};
use crate::geo::{self, GeoPoint};
use crate::nlu::context::{Budget, Effort, FindContext, HikeLength, Meal, Social, Timing, Transport, Vibe, Weather};
use crate::profile::PreferenceProfile;
use crate::rank::scorer;

// ---------------------------------------------------------------------------
// Soft-score weights
// ---------------------------------------------------------------------------

/// Preference affinity dominates the blend.
const PREFERENCE_WEIGHT: f32 = 1.6;

/// Distance decay: full credit at the base location, zero at this range.
const DISTANCE_HORIZON_KM: f64 = 12.0;
const DISTANCE_WEIGHT: f32 = 2.0;

/// Duration decay: shorter is favored, heavily so under time pressure.
const DURATION_HORIZON_MIN: f32 = 180.0;
const DURATION_WEIGHT_PRESSED: f32 = 1.5;
const DURATION_WEIGHT_RELAXED: f32 = 0.3;

const RATING_WEIGHT: f32 = 0.6;

/// Spread of the seeded tiebreaker, small enough to only reorder near-ties.
const JITTER_SPAN: f32 = 0.25;

/// Shortlist size.
const MAX_PICKS: usize = 4;

/// Assumed visit length when a duration label doesn't parse.
const DEFAULT_DURATION_MIN: u32 = 60;

// Hard-filter ceilings.
const QUICK_DURATION_CEILING_MIN: u32 = 60;
const SHORT_HIKE_CEILING_MIN: u32 = 75;
const LONG_HIKE_FLOOR_MIN: u32 = 90;
const NEAR_ONLY_CEILING_KM: f64 = 3.0;

/// One ranked shortlist entry.
#[derive(Debug, Clone)]
pub struct RankedPlace {
    pub place: Place,
    pub preference: u8,
    pub score: f32,
    pub distance_km: f64,
}

/// Result of a ranking pass. Zero survivors is an explicit outcome, never
/// an empty success.
#[derive(Debug, Clone)]
pub enum RankOutcome {
    Ranked(Vec<RankedPlace>),
    /// Every place was eliminated; `relax` names the dimension whose
    /// filter first emptied the pool.
    NoMatch { relax: &'static str },
}

fn vibe_categories(vibe: Vibe) -> Option<&'static [Category]> {
    match vibe {
        Vibe::Outdoor => Some(&[
            Category::Hike,
            Category::Park,
            Category::Beach,
            Category::Viewpoint,
        ]),
        Vibe::Indoor => Some(&[
            Category::Cafe,
            Category::Museum,
            Category::StudySpot,
            Category::Bar,
            Category::LiveMusic,
        ]),
        Vibe::Food => Some(&[Category::Restaurant, Category::Cafe, Category::Market]),
        Vibe::Mix => None,
    }
}

fn meal_categories(meal: Meal) -> &'static [Category] {
    match meal {
        Meal::Coffee => &[Category::Cafe],
        Meal::Breakfast | Meal::Brunch => &[Category::Cafe, Category::Restaurant],
        Meal::Lunch | Meal::Dinner => &[Category::Restaurant, Category::Market],
        Meal::LateNight => &[Category::Restaurant, Category::Bar, Category::Market],
    }
}

fn social_categories(social: Social) -> Option<&'static [Category]> {
    match social {
        Social::Solo => None,
        Social::Date => Some(&[
            Category::Restaurant,
            Category::Viewpoint,
            Category::Bar,
            Category::Cafe,
            Category::Beach,
            Category::LiveMusic,
        ]),
        Social::Group => Some(&[
            Category::Bar,
            Category::Park,
            Category::LiveMusic,
            Category::Restaurant,
            Category::Beach,
            Category::Market,
        ]),
    }
}

fn weather_categories(weather: Weather) -> Option<&'static [Category]> {
    const INDOOR: &[Category] = &[
        Category::Cafe,
        Category::Restaurant,
        Category::Bar,
        Category::Museum,
        Category::StudySpot,
        Category::LiveMusic,
        Category::Market,
    ];
    match weather {
        Weather::Rainy | Weather::Windy | Weather::Cold => Some(INDOOR),
        Weather::Hot => Some(&[
            Category::Beach,
            Category::Park,
            Category::Cafe,
            Category::Museum,
        ]),
        Weather::Sunny => None,
    }
}

fn effort_allows(effort: Effort, place: &Place) -> bool {
    match effort {
        Effort::Active => matches!(
            place.category,
            Category::Hike | Category::Park | Category::Beach
        ),
        Effort::Chill => place.category != Category::Hike,
    }
}

fn budget_tiers(budget: Budget) -> Option<&'static [PriceTier]> {
    match budget {
        Budget::Free => Some(&[PriceTier::Free]),
        Budget::Cheap => Some(&[PriceTier::Free, PriceTier::Budget]),
        Budget::Flexible => None,
    }
}

fn transport_ceiling_km(transport: Transport) -> Option<f64> {
    match transport {
        Transport::Walk => Some(2.5),
        Transport::Bike => Some(8.0),
        Transport::Bus => Some(15.0),
        Transport::Car => None,
    }
}

fn duration_minutes(place: &Place) -> u32 {
    geo::parse_duration_minutes(&place.duration_label).unwrap_or(DEFAULT_DURATION_MIN)
}

/// Time-of-day bonus per category. Evening favors views, music, and food;
/// mornings favor coffee, trails, and studying.
fn time_of_day_bonus(hour: u32, category: Category) -> f32 {
    match hour {
        5..=10 => match category {
            Category::Cafe => 1.0,
            Category::Hike => 0.8,
            Category::StudySpot => 0.5,
            Category::Park => 0.3,
            _ => 0.0,
        },
        11..=16 => match category {
            Category::Park | Category::Beach => 0.5,
            Category::Museum | Category::Market | Category::Restaurant => 0.3,
            _ => 0.0,
        },
        17..=21 => match category {
            Category::Viewpoint | Category::LiveMusic => 1.0,
            Category::Restaurant | Category::Bar => 0.8,
            _ => 0.0,
        },
        _ => match category {
            Category::Bar => 1.0,
            Category::LiveMusic => 0.5,
            Category::Restaurant => 0.3,
            _ => 0.0,
        },
    }
}

struct HardFilter {
    dimension: &'static str,
    keep: Box<dyn Fn(&Place, f64) -> bool>,
}

fn hard_filters(ctx: &FindContext) -> Vec<HardFilter> {
    let mut filters: Vec<HardFilter> = Vec::new();

    if let Some(categories) = ctx.vibe.and_then(vibe_categories) {
        filters.push(HardFilter {
            dimension: "vibe",
            keep: Box::new(move |p, _| categories.contains(&p.category)),
        });
    }

    if let Some(meal) = ctx.meal {
        let categories = meal_categories(meal);
        filters.push(HardFilter {
            dimension: "meal",
            keep: Box::new(move |p, _| categories.contains(&p.category)),
        });
    }

    if let Some(categories) = ctx.social.and_then(social_categories) {
        filters.push(HardFilter {
            dimension: "company",
            keep: Box::new(move |p, _| categories.contains(&p.category)),
        });
    }

    if let Some(categories) = ctx.weather.and_then(weather_categories) {
        filters.push(HardFilter {
            dimension: "weather",
            keep: Box::new(move |p, _| categories.contains(&p.category)),
        });
    }

    if let Some(effort) = ctx.effort {
        filters.push(HardFilter {
            dimension: "effort",
            keep: Box::new(move |p, _| effort_allows(effort, p)),
        });
    }

    if let Some(length) = ctx.hike_length {
        filters.push(HardFilter {
            dimension: "hike length",
            keep: Box::new(move |p, _| {
                p.category == Category::Hike
                    && match length {
                        HikeLength::Short => duration_minutes(p) <= SHORT_HIKE_CEILING_MIN,
                        HikeLength::Long => duration_minutes(p) >= LONG_HIKE_FLOOR_MIN,
                    }
            }),
        });
    }

    if ctx.wants_swim {
        filters.push(HardFilter {
            dimension: "swimming",
            keep: Box::new(|p, _| p.has_feature("swimming")),
        });
    }

    if ctx.wants_tan {
        filters.push(HardFilter {
            dimension: "sun",
            keep: Box::new(|p, _| p.has_feature("sun-spot")),
        });
    }

    if let Some(tiers) = ctx.budget.and_then(budget_tiers) {
        filters.push(HardFilter {
            dimension: "budget",
            keep: Box::new(move |p, _| tiers.contains(&p.price)),
        });
    }

    if ctx.timing == Some(Timing::Quick) {
        filters.push(HardFilter {
            dimension: "time",
            keep: Box::new(|p, _| duration_minutes(p) <= QUICK_DURATION_CEILING_MIN),
        });
    }

    if let Some(ceiling) = ctx.transport.and_then(transport_ceiling_km) {
        filters.push(HardFilter {
            dimension: "distance",
            keep: Box::new(move |_, km| km <= ceiling),
        });
    }

    if ctx.near_only {
        filters.push(HardFilter {
            dimension: "distance",
            keep: Box::new(|_, km| km <= NEAR_ONLY_CEILING_KM),
        });
    }

    filters
}

/// Rank the catalog against a context. `seed` keeps the tiebreaker
/// deterministic for identical requests.
pub fn rank(
    catalog: &Catalog,
    ctx: &FindContext,
    profile: &PreferenceProfile,
    base: GeoPoint,
    hour: u32,
    seed: u64,
) -> RankOutcome {
    let mut pool: Vec<(&Place, f64)> = catalog
        .places()
        .iter()
        .map(|p| (p, geo::haversine_km(base, p.location)))
        .collect();

    for filter in hard_filters(ctx) {
        pool.retain(|(place, km)| (filter.keep)(place, *km));
        if pool.is_empty() {
            debug!(dimension = filter.dimension, "hard filter emptied the pool");
            return RankOutcome::NoMatch {
                relax: filter.dimension,
            };
        }
    }

    let time_pressed = matches!(ctx.timing, Some(Timing::Quick) | Some(Timing::Now));
    let duration_weight = if time_pressed {
        DURATION_WEIGHT_PRESSED
    } else {
        DURATION_WEIGHT_RELAXED
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut ranked: Vec<RankedPlace> = pool
        .into_iter()
        .map(|(place, km)| {
            let preference = scorer::score(place, profile);
            let distance_term =
                (1.0 - (km / DISTANCE_HORIZON_KM) as f32).max(0.0) * DISTANCE_WEIGHT;
            let duration_term = (1.0
                - duration_minutes(place) as f32 / DURATION_HORIZON_MIN)
                .max(0.0)
                * duration_weight;
            let rating_term = place.rating * RATING_WEIGHT;
            let tod_term = time_of_day_bonus(hour, place.category);
            let jitter: f32 = rng.gen_range(0.0..JITTER_SPAN);

            let score = preference as f32 * PREFERENCE_WEIGHT
                + distance_term
                + duration_term
                + rating_term
                + tod_term
                + jitter;

            RankedPlace {
                place: place.clone(),
                preference,
                score,
                distance_km: km,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(MAX_PICKS);

    debug!(picks = ranked.len(), "ranking complete");
    RankOutcome::Ranked(ranked)
}
