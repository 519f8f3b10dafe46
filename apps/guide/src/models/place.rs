use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::null_as_default;

/// Place category as stored in the `places.category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Restaurants & Cafes")]
    Restaurants,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Cultural Sites")]
    Cultural,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Events")]
    Events,
    #[serde(rename = "Kids Activity")]
    Kids,
    /// Any value the store holds that this service does not know about.
    #[serde(other)]
    Other,
}

impl Category {
    /// The exact string stored in the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurants => "Restaurants & Cafes",
            Category::Shopping => "Shopping",
            Category::Cultural => "Cultural Sites",
            Category::Entertainment => "Entertainment",
            Category::Events => "Events",
            Category::Kids => "Kids Activity",
            Category::Other => "Other",
        }
    }

    /// Maps a URL slug (`restaurants`, `kids`, ...) to its category.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "restaurants" => Some(Category::Restaurants),
            "shopping" => Some(Category::Shopping),
            "cultural" => Some(Category::Cultural),
            "entertainment" => Some(Category::Entertainment),
            "events" => Some(Category::Events),
            "kids" => Some(Category::Kids),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Summer,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "summer" => Some(Season::Summer),
            "winter" => Some(Season::Winter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub address: Option<String>,
    /// `[latitude, longitude]`
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub opening_hours: Option<Value>,
    #[serde(default)]
    pub contact_info: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub seasonal: Option<Season>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Compact projection embedded in activities and notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

impl From<&Place> for PlaceSummary {
    fn from(place: &Place) -> Self {
        PlaceSummary {
            id: place.id,
            name: place.name.clone(),
            address: place.address.clone(),
            images: place.images.clone(),
        }
    }
}
