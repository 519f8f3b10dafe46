//! Saved places: the bookmark button and the saved tab.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_rows, DataClient, Filter, Query as RowQuery, Table};
use crate::errors::{AppError, OrScreen};
use crate::listing;
use crate::models::place::{Category, Place};
use crate::places::catalog;
use crate::scope::RequestScope;
use crate::state::AppState;

const LOAD_SAVED: &str = "Failed to load saved places";
const REMOVE_SAVED: &str = "Failed to remove place";
const TOGGLE_SAVED: &str = "Failed to update saved places";

#[derive(Deserialize)]
struct SavedRow {
    place_id: Uuid,
}

#[derive(Deserialize)]
pub struct SavedParams {
    #[serde(default)]
    pub q: String,
    /// A category slug; absent or unknown means every category.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveState {
    pub place_id: Uuid,
    pub saved: bool,
}

fn saved_by(session: &Session, place_id: Uuid) -> Vec<Filter> {
    vec![
        Filter::eq("place_id", json!(place_id)),
        Filter::eq("user_id", json!(session.user_id)),
    ]
}

async fn unsave(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
    place_id: Uuid,
    message: &'static str,
) -> Result<(), AppError> {
    scope
        .run(data.delete_where(Table::SavedPlaces, saved_by(session, place_id)))
        .await?
        .or_screen(message)
}

/// GET /api/v1/saved
pub async fn handle_list_saved(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Query(params): Query<SavedParams>,
) -> Result<Json<Vec<Place>>, AppError> {
    let data = state.data.for_session(&session);

    let query = RowQuery::new()
        .eq("user_id", json!(session.user_id))
        .order_by("created_at", false);
    let rows = scope
        .run(data.fetch_rows(Table::SavedPlaces, query))
        .await?
        .or_screen(LOAD_SAVED)?;
    let saved: Vec<SavedRow> = decode_rows(rows).or_screen(LOAD_SAVED)?;
    let ids: Vec<Uuid> = saved.iter().map(|s| s.place_id).collect();

    let mut places = catalog::fetch_by_ids(data.as_ref(), &scope, &ids, LOAD_SAVED).await?;
    // Most recently saved first.
    places.sort_by_key(|p| ids.iter().position(|id| *id == p.id));

    let category = params.category.as_deref().and_then(Category::from_slug);
    Ok(Json(listing::filter_saved(&places, &params.q, category)))
}

/// POST /api/v1/saved/:place_id/toggle
pub async fn handle_toggle_saved(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(place_id): Path<Uuid>,
) -> Result<Json<SaveState>, AppError> {
    let _ticket = state.submissions.begin(session.user_id, "save", place_id)?;
    let data = state.data.for_session(&session);

    let saved = catalog::is_saved(data.as_ref(), &scope, &session, place_id).await?;
    if saved {
        unsave(data.as_ref(), &scope, &session, place_id, TOGGLE_SAVED).await?;
    } else {
        let row = json!({ "place_id": place_id, "user_id": session.user_id });
        scope
            .run(data.insert_row(Table::SavedPlaces, row))
            .await?
            .or_screen(TOGGLE_SAVED)?;
    }

    tracing::debug!(%place_id, saved = !saved, "Saved state toggled");
    Ok(Json(SaveState {
        place_id,
        saved: !saved,
    }))
}

/// DELETE /api/v1/saved/:place_id
pub async fn handle_remove_saved(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(place_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let data = state.data.for_session(&session);
    unsave(data.as_ref(), &scope, &session, place_id, REMOVE_SAVED).await?;
    Ok(StatusCode::NO_CONTENT)
}
