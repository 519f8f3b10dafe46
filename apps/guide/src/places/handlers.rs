use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::listing::{self, DiscoverFeed};
use crate::models::place::Place;
use crate::places::catalog::{self, CategoryView, PlaceDetail, PlaceSort};
use crate::scope::RequestScope;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct CategoryParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: PlaceSort,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub title: &'static str,
    pub places: Vec<Place>,
}

/// GET /api/v1/discover
pub async fn handle_discover(
    State(state): State<AppState>,
    scope: RequestScope,
) -> Result<Json<DiscoverFeed>, AppError> {
    // Season is fixed for the lifetime of this request.
    let offset = state.config.default_offset();
    let season = listing::season_on(Utc::now().with_timezone(&offset).date_naive());

    let places = catalog::fetch_all(state.data.as_ref(), &scope).await?;
    Ok(Json(DiscoverFeed::derive(&places, season)))
}

/// GET /api/v1/places/search
pub async fn handle_search(
    State(state): State<AppState>,
    scope: RequestScope,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Place>>, AppError> {
    let places = catalog::search_by_name(state.data.as_ref(), &scope, &params.q).await?;
    Ok(Json(places))
}

/// GET /api/v1/places/map
pub async fn handle_map(
    State(state): State<AppState>,
    scope: RequestScope,
) -> Result<Json<Vec<Place>>, AppError> {
    let places = catalog::fetch_all(state.data.as_ref(), &scope).await?;
    Ok(Json(catalog::with_coordinates(places)))
}

/// GET /api/v1/categories/:slug
pub async fn handle_category(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(slug): Path<String>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<CategoryResponse>, AppError> {
    let view = CategoryView::from_slug(&slug);
    let places =
        catalog::fetch_category(state.data.as_ref(), &scope, view, &params.q, params.sort).await?;
    Ok(Json(CategoryResponse {
        title: view.title(),
        places,
    }))
}

/// GET /api/v1/places/:id
pub async fn handle_place_detail(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Option<Session>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaceDetail>, AppError> {
    let detail = match &session {
        Some(session) => {
            let data = state.data.for_session(session);
            catalog::place_detail(data.as_ref(), &scope, Some(session), id).await?
        }
        None => catalog::place_detail(state.data.as_ref(), &scope, None, id).await?,
    };
    Ok(Json(detail))
}
