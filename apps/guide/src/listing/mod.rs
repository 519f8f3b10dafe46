//! List Derivation: display-ready views over rows that were already fetched.
//!
//! Every function here is pure and leaves its input untouched; each call
//! returns a fresh `Vec`. Sorts are stable.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::place::{Category, Place, Season};
use crate::models::review::ReviewWithAuthor;

/// Entries shown per section of the discover feed.
pub const FEED_SECTION_LIMIT: usize = 5;

/// Months 4 through 10 are summer; everything else is winter.
pub fn season_for_month(month: u32) -> Season {
    if (4..=10).contains(&month) {
        Season::Summer
    } else {
        Season::Winter
    }
}

pub fn season_on(date: NaiveDate) -> Season {
    season_for_month(date.month())
}

pub fn filter_by_category(places: &[Place], category: Category) -> Vec<Place> {
    places
        .iter()
        .filter(|p| p.category == category)
        .cloned()
        .collect()
}

pub fn filter_by_season(places: &[Place], season: Season) -> Vec<Place> {
    places
        .iter()
        .filter(|p| p.seasonal == Some(season))
        .cloned()
        .collect()
}

/// Highest rating first; equal ratings keep their incoming order.
pub fn sort_by_rating_desc(places: &[Place]) -> Vec<Place> {
    let mut sorted = places.to_vec();
    sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    sorted
}

pub fn sort_by_newest(places: &[Place]) -> Vec<Place> {
    let mut sorted = places.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

pub fn top_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items.iter().take(n).cloned().collect()
}

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

/// Case-insensitive substring match on name or description. A blank query
/// keeps everything.
pub fn search_places(places: &[Place], query: &str) -> Vec<Place> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return places.to_vec();
    }
    places
        .iter()
        .filter(|p| {
            contains_ci(Some(&p.name), &needle) || contains_ci(p.description.as_deref(), &needle)
        })
        .cloned()
        .collect()
}

/// Saved-places screen: free text AND an optional category.
pub fn filter_saved(places: &[Place], query: &str, category: Option<Category>) -> Vec<Place> {
    let matching = search_places(places, query);
    match category {
        Some(category) => filter_by_category(&matching, category),
        None => matching,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reviews
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSort {
    #[default]
    Date,
    Rating,
}

/// Case-insensitive substring match on review text or author name.
pub fn filter_reviews(reviews: &[ReviewWithAuthor], query: &str) -> Vec<ReviewWithAuthor> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return reviews.to_vec();
    }
    reviews
        .iter()
        .filter(|r| {
            contains_ci(r.content.as_deref(), &needle) || contains_ci(r.username.as_deref(), &needle)
        })
        .cloned()
        .collect()
}

pub fn sort_reviews(reviews: &[ReviewWithAuthor], sort: ReviewSort) -> Vec<ReviewWithAuthor> {
    let mut sorted = reviews.to_vec();
    match sort {
        ReviewSort::Date => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ReviewSort::Rating => sorted.sort_by(|a, b| b.rating.cmp(&a.rating)),
    }
    sorted
}

// ────────────────────────────────────────────────────────────────────────────
// Discover feed
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverFeed {
    pub season: Season,
    pub latest_events: Vec<Place>,
    pub top_rated: Vec<Place>,
    pub seasonal: Vec<Place>,
}

impl DiscoverFeed {
    pub fn derive(places: &[Place], season: Season) -> Self {
        let events = filter_by_category(places, Category::Events);
        DiscoverFeed {
            season,
            latest_events: top_n(&sort_by_newest(&events), FEED_SECTION_LIMIT),
            top_rated: top_n(&sort_by_rating_desc(places), FEED_SECTION_LIMIT),
            seasonal: top_n(&filter_by_season(places, season), FEED_SECTION_LIMIT),
        }
    }
}
