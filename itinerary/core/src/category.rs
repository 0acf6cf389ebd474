//! Location categories
//!
//! The model tags each waypoint with a free-form `type`. Rendering layers map
//! it to a marker through this closed set; unknown or missing types fall back
//! to [`LocationCategory::Generic`]. The raw string is kept on the location
//! for display.

use serde::{Deserialize, Serialize};

/// Closed set of waypoint categories understood by rendering layers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationCategory {
    /// Temples and other places of worship
    Temple,
    /// Cafes and coffee shops
    Cafe,
    /// Restaurants and food stalls
    Restaurant,
    /// Parks and gardens
    Park,
    /// Hotels and other lodging
    Hotel,
    /// Shopping malls
    Mall,
    /// Landmarks and sights
    Landmark,
    /// Nature spots, camping, viewpoints
    Nature,
    /// Markets
    Market,
    /// Anything not recognized
    #[default]
    Generic,
}

impl LocationCategory {
    /// Every category, fallback last
    pub const ALL: [Self; 10] = [
        Self::Temple,
        Self::Cafe,
        Self::Restaurant,
        Self::Park,
        Self::Hotel,
        Self::Mall,
        Self::Landmark,
        Self::Nature,
        Self::Market,
        Self::Generic,
    ];

    /// Map a raw `type` label to a category
    ///
    /// Accepts the English label (case-insensitive) or the Thai label the
    /// model uses when it answers in Thai.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let label = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| {
                *category != Self::Generic
                    && (label == category.label() || label == category.thai_label())
            })
            .unwrap_or(Self::Generic)
    }

    /// Map an optional raw label, treating `None` as generic
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map_or(Self::Generic, Self::from_raw)
    }

    /// English label, as used in the model's type vocabulary
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Temple => "temple",
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Park => "park",
            Self::Hotel => "hotel",
            Self::Mall => "mall",
            Self::Landmark => "landmark",
            Self::Nature => "nature",
            Self::Market => "market",
            Self::Generic => "generic",
        }
    }

    /// Thai label
    #[must_use]
    pub fn thai_label(self) -> &'static str {
        match self {
            Self::Temple => "วัด",
            Self::Cafe => "คาเฟ่",
            Self::Restaurant => "ร้านอาหาร",
            Self::Park => "สวนสาธารณะ",
            Self::Hotel => "โรงแรม",
            Self::Mall => "ห้างสรรพสินค้า",
            Self::Landmark => "สถานที่สำคัญ",
            Self::Nature => "ธรรมชาติ",
            Self::Market => "ตลาด",
            Self::Generic => "ทั่วไป",
        }
    }

    /// Whether this is the fallback category
    #[must_use]
    pub fn is_generic(self) -> bool {
        self == Self::Generic
    }
}

impl std::fmt::Display for LocationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
