//! Place catalog: the read-only collection of curated places the engine
//! ranks over. Content and curation live outside this crate; the engine
//! only loads and queries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CatalogError;
use crate::geo::GeoPoint;

/// Closed set of place categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cafe,
    Restaurant,
    Bar,
    Hike,
    Park,
    Beach,
    Viewpoint,
    Museum,
    StudySpot,
    LiveMusic,
    Market,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Cafe => "Cafe",
            Category::Restaurant => "Restaurant",
            Category::Bar => "Bar",
            Category::Hike => "Hike",
            Category::Park => "Park",
            Category::Beach => "Beach",
            Category::Viewpoint => "Viewpoint",
            Category::Museum => "Museum",
            Category::StudySpot => "Study Spot",
            Category::LiveMusic => "Live Music",
            Category::Market => "Market",
        };
        f.write_str(label)
    }
}

/// Ordered price tiers: `Free < $ < $$ < $$$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Splurge,
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self {
            PriceTier::Free => "Free",
            PriceTier::Budget => "$",
            PriceTier::Moderate => "$$",
            PriceTier::Splurge => "$$$",
        };
        f.write_str(glyph)
    }
}

/// A single catalog entry. Immutable per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price: PriceTier,
    pub rating: f32,
    pub location: GeoPoint,
    #[serde(default)]
    pub distance_label: String,
    #[serde(default)]
    pub duration_label: String,
    #[serde(default)]
    pub description: String,
}

impl Place {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn has_tag_containing(&self, fragment: &str) -> bool {
        self.tags.iter().any(|t| t.contains(fragment))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    places: Vec<Place>,
}

/// The fixed place collection for a session.
#[derive(Debug, Clone)]
pub struct Catalog {
    places: Vec<Place>,
}

impl Catalog {
    pub fn from_places(places: Vec<Place>) -> Result<Self, CatalogError> {
        if places.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { places })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Self::from_places(file.places)
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn get(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Place> {
        self.places.iter().filter(move |p| p.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_tier_ordering() {
        assert!(PriceTier::Free < PriceTier::Budget);
        assert!(PriceTier::Budget < PriceTier::Moderate);
        assert!(PriceTier::Moderate < PriceTier::Splurge);
    }

    #[test]
    fn test_load_sample_catalog() {
        let catalog = Catalog::from_json_str(include_str!("../config/catalog.sample.json")).unwrap();
        assert!(catalog.places().len() >= 12);
        assert!(catalog.get("luigis").is_some());
        assert_eq!(
            catalog.get("luigis").unwrap().category,
            Category::Restaurant
        );
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            Catalog::from_places(vec![]),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_price_tier_json_round() {
        let tier: PriceTier = serde_json::from_str("\"$$\"").unwrap();
        assert_eq!(tier, PriceTier::Moderate);
    }
}
