use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_rows, decode_single, DataClient, Filter, Query, Table};
use crate::errors::{AppError, OrScreen};
use crate::models::place::{Category, Place, Season};
use crate::models::review::ReviewWithAuthor;
use crate::scope::RequestScope;

/// Rows shown on the top-rated listing.
pub const TOP_RATED_LIMIT: usize = 20;
/// Rows returned to the plan composer's search box.
pub const COMPOSER_SEARCH_LIMIT: usize = 10;
/// Shorter queries return nothing rather than the whole catalogue.
pub const COMPOSER_MIN_QUERY_CHARS: usize = 2;

const LOAD_PLACES: &str = "Failed to load places";

/// Which slice of the catalogue a category screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryView {
    TopRated,
    Seasonal(Season),
    Category(Category),
    /// Unknown slug: everything.
    All,
}

impl CategoryView {
    pub fn from_slug(slug: &str) -> Self {
        if slug == "top-rated" {
            return CategoryView::TopRated;
        }
        if let Some(season) = Season::from_slug(slug) {
            return CategoryView::Seasonal(season);
        }
        Category::from_slug(slug)
            .map(CategoryView::Category)
            .unwrap_or(CategoryView::All)
    }

    pub fn title(&self) -> &'static str {
        match self {
            CategoryView::TopRated => "Top Rated Places",
            CategoryView::Seasonal(Season::Summer) => "Summer Activities",
            CategoryView::Seasonal(Season::Winter) => "Winter Activities",
            CategoryView::Category(category) => category.as_str(),
            CategoryView::All => "Places",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSort {
    #[default]
    Rating,
    Name,
}

/// Builds the store query behind a category screen.
pub fn category_query(view: CategoryView, search: &str, sort: PlaceSort) -> Query {
    let mut query = Query::new();

    match view {
        CategoryView::TopRated => {
            query = query.order_by("rating", false).limit(TOP_RATED_LIMIT);
        }
        CategoryView::Seasonal(season) => query = query.eq("seasonal", season.as_str()),
        CategoryView::Category(category) => query = query.eq("category", category.as_str()),
        CategoryView::All => {}
    }

    let search = search.trim();
    if !search.is_empty() {
        query = query.filter(Filter::contains("name", search));
    }

    match sort {
        PlaceSort::Name => query.order_by("name", true),
        PlaceSort::Rating if view == CategoryView::TopRated => query,
        PlaceSort::Rating => query.order_by("rating", false),
    }
}

pub async fn fetch_all(data: &dyn DataClient, scope: &RequestScope) -> Result<Vec<Place>, AppError> {
    let rows = scope
        .run(data.fetch_rows(Table::Places, Query::new()))
        .await?
        .or_screen(LOAD_PLACES)?;
    decode_rows(rows).or_screen(LOAD_PLACES)
}

pub async fn fetch_category(
    data: &dyn DataClient,
    scope: &RequestScope,
    view: CategoryView,
    search: &str,
    sort: PlaceSort,
) -> Result<Vec<Place>, AppError> {
    let rows = scope
        .run(data.fetch_rows(Table::Places, category_query(view, search, sort)))
        .await?
        .or_screen(LOAD_PLACES)?;
    decode_rows(rows).or_screen(LOAD_PLACES)
}

/// Name search used while composing a plan.
pub async fn search_by_name(
    data: &dyn DataClient,
    scope: &RequestScope,
    text: &str,
) -> Result<Vec<Place>, AppError> {
    let text = text.trim();
    if text.chars().count() < COMPOSER_MIN_QUERY_CHARS {
        return Ok(Vec::new());
    }
    let query = Query::new()
        .filter(Filter::contains("name", text))
        .limit(COMPOSER_SEARCH_LIMIT);
    let rows = scope
        .run(data.fetch_rows(Table::Places, query))
        .await?
        .or_screen("Failed to search places")?;
    decode_rows(rows).or_screen("Failed to search places")
}

pub async fn fetch_by_ids(
    data: &dyn DataClient,
    scope: &RequestScope,
    ids: &[Uuid],
    message: &'static str,
) -> Result<Vec<Place>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = Query::new().filter(Filter::any_of("id", ids.iter().map(|id| json!(id))));
    let rows = scope
        .run(data.fetch_rows(Table::Places, query))
        .await?
        .or_screen(message)?;
    decode_rows(rows).or_screen(message)
}

/// Places that can be pinned on the map.
pub fn with_coordinates(places: Vec<Place>) -> Vec<Place> {
    places
        .into_iter()
        .filter(|p| p.coordinates.is_some())
        .collect()
}

#[derive(Debug, Serialize)]
pub struct PlaceDetail {
    pub place: Place,
    /// Always `false` for anonymous callers.
    pub is_saved: bool,
    pub reviews: Vec<ReviewWithAuthor>,
}

pub async fn fetch_reviews(
    data: &dyn DataClient,
    scope: &RequestScope,
    place_id: Uuid,
) -> Result<Vec<ReviewWithAuthor>, AppError> {
    let rows = scope
        .run(data.invoke_procedure(
            "get_reviews_with_users",
            json!({ "place_id_param": place_id }),
        ))
        .await?
        .or_screen("Failed to load reviews")?;
    decode_rows(rows).or_screen("Failed to load reviews")
}

pub async fn is_saved(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
    place_id: Uuid,
) -> Result<bool, AppError> {
    let rows = scope
        .run(data.invoke_procedure(
            "get_saved_place",
            json!({ "place_id_param": place_id, "user_id_param": session.user_id }),
        ))
        .await?
        .or_screen("Failed to load place details")?;
    Ok(!rows.is_empty())
}

pub async fn place_detail(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: Option<&Session>,
    place_id: Uuid,
) -> Result<PlaceDetail, AppError> {
    const LOAD_DETAIL: &str = "Failed to load place details";

    let rows = scope
        .run(data.fetch_rows(Table::Places, Query::new().eq("id", json!(place_id)).limit(1)))
        .await?
        .or_screen(LOAD_DETAIL)?;
    let place: Place = decode_single(Table::Places, rows).or_screen(LOAD_DETAIL)?;

    let is_saved = match session {
        Some(session) => is_saved(data, scope, session, place_id).await?,
        None => false,
    };
    let reviews = fetch_reviews(data, scope, place_id).await?;

    Ok(PlaceDetail {
        place,
        is_saved,
        reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_client::memory::MemoryDataClient;
    use crate::data_client::query::Order;
    use crate::testing::place_row;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_category_view_from_slug() {
        assert_eq!(CategoryView::from_slug("top-rated"), CategoryView::TopRated);
        assert_eq!(
            CategoryView::from_slug("winter"),
            CategoryView::Seasonal(Season::Winter)
        );
        assert_eq!(
            CategoryView::from_slug("restaurants"),
            CategoryView::Category(Category::Restaurants)
        );
        assert_eq!(CategoryView::from_slug("nightlife"), CategoryView::All);
        assert_eq!(CategoryView::from_slug("summer").title(), "Summer Activities");
        assert_eq!(CategoryView::from_slug("kids").title(), "Kids Activity");
    }

    #[test]
    fn test_top_rated_query_orders_and_limits() {
        let query = category_query(CategoryView::TopRated, "", PlaceSort::Rating);
        assert_eq!(query.limit, Some(TOP_RATED_LIMIT));
        assert_eq!(
            query.order,
            vec![Order {
                column: "rating",
                ascending: false
            }]
        );
    }

    #[test]
    fn test_category_query_with_search_and_name_sort() {
        let query = category_query(
            CategoryView::Category(Category::Events),
            " fest ",
            PlaceSort::Name,
        );
        assert_eq!(
            query.filters,
            vec![
                Filter::eq("category", "Events"),
                Filter::contains("name", "fest")
            ]
        );
        assert_eq!(
            query.order,
            vec![Order {
                column: "name",
                ascending: true
            }]
        );
        assert!(query.limit.is_none());
    }

    #[tokio::test]
    async fn test_search_by_name_skips_short_queries() {
        let data = MemoryDataClient::new();
        let scope = RequestScope::child_of(&CancellationToken::new());

        let found = search_by_name(&data, &scope, "g").await.unwrap();
        assert!(found.is_empty());
        assert!(data.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_name_is_case_insensitive_and_limited() {
        let data = MemoryDataClient::new();
        let mut rows = vec![place_row("Grand Mosque", "Cultural Sites", 4.8)];
        rows.extend((0..12).map(|i| place_row(&format!("Grand Stall {i}"), "Shopping", 3.0)));
        rows.push(place_row("souk", "Shopping", 4.0));
        data.seed(Table::Places, rows);
        let scope = RequestScope::child_of(&CancellationToken::new());

        let found = search_by_name(&data, &scope, "GRAND").await.unwrap();
        assert_eq!(found.len(), COMPOSER_SEARCH_LIMIT);
        assert!(found.iter().all(|p| p.name.starts_with("Grand")));
    }

    #[tokio::test]
    async fn test_place_detail_for_anonymous_caller_skips_saved_lookup() {
        let data = MemoryDataClient::new();
        let row = place_row("Fort", "Cultural Sites", 4.1);
        let id: Uuid = serde_json::from_value(row["id"].clone()).unwrap();
        data.seed(Table::Places, vec![row]);
        let scope = RequestScope::child_of(&CancellationToken::new());

        let detail = place_detail(&data, &scope, None, id).await.unwrap();
        assert_eq!(detail.place.name, "Fort");
        assert!(!detail.is_saved);
        assert!(!data
            .calls()
            .iter()
            .any(|c| c.contains("get_saved_place")));
    }

    #[tokio::test]
    async fn test_place_detail_missing_place_is_not_found() {
        let data = MemoryDataClient::new();
        let scope = RequestScope::child_of(&CancellationToken::new());
        let err = place_detail(&data, &scope, None, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_screen_message() {
        let data = MemoryDataClient::new();
        data.fail_on("fetch_rows", Table::Places);
        let scope = RequestScope::child_of(&CancellationToken::new());

        match fetch_all(&data, &scope).await {
            Err(AppError::Data { message, .. }) => assert_eq!(message, LOAD_PLACES),
            other => panic!("unexpected {other:?}"),
        }
    }
}
