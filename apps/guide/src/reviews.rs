use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_row, encode, Table};
use crate::errors::{AppError, OrScreen};
use crate::listing::{self, ReviewSort};
use crate::models::review::{NewReview, Review, ReviewWithAuthor};
use crate::places::catalog;
use crate::scope::RequestScope;
use crate::state::AppState;

const POST_REVIEW: &str = "Failed to post review";

#[derive(Deserialize)]
pub struct ReviewParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: ReviewSort,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub content: Option<String>,
}

impl ReviewRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }

    /// Blank text is stored as no text.
    fn content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// GET /api/v1/places/:id/reviews
pub async fn handle_list_reviews(
    State(state): State<AppState>,
    scope: RequestScope,
    Path(place_id): Path<Uuid>,
    Query(params): Query<ReviewParams>,
) -> Result<Json<Vec<ReviewWithAuthor>>, AppError> {
    let reviews = catalog::fetch_reviews(state.data.as_ref(), &scope, place_id).await?;
    let reviews = listing::filter_reviews(&reviews, &params.q);
    Ok(Json(listing::sort_reviews(&reviews, params.sort)))
}

/// POST /api/v1/places/:id/reviews
pub async fn handle_create_review(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(place_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    req.validate()?;
    let _ticket = state
        .submissions
        .begin(session.user_id, "review", place_id)?;

    let payload = encode(&NewReview {
        place_id,
        user_id: session.user_id,
        rating: req.rating,
        content: req.content(),
    })
    .or_screen(POST_REVIEW)?;

    let data = state.data.for_session(&session);
    let row = scope
        .run(data.insert_row(Table::Reviews, payload))
        .await?
        .or_screen(POST_REVIEW)?;
    let review: Review = decode_row(row).or_screen(POST_REVIEW)?;

    tracing::info!(review_id = %review.id, %place_id, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}
