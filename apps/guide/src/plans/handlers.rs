use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Session;
use crate::config::{offset_from_minutes, Config};
use crate::errors::AppError;
use crate::itinerary::day_start;
use crate::itinerary::share::{agenda_for_date, share_text};
use crate::models::plan::{PlanStop, PlanWithItems};
use crate::plans::compose::{self, CreatePlanRequest, CreatedPlan};
use crate::plans::queries;
use crate::scope::RequestScope;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OffsetParams {
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Deserialize)]
pub struct AgendaParams {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Serialize)]
pub struct AgendaResponse {
    pub date: NaiveDate,
    pub items: Vec<PlanStop>,
}

#[derive(Serialize)]
pub struct ShareMessage {
    pub title: String,
    pub message: String,
}

/// The caller's offset, or the configured default when none was sent.
fn resolve_offset(config: &Config, minutes: Option<i32>) -> Result<FixedOffset, AppError> {
    match minutes {
        Some(minutes) => offset_from_minutes(minutes)
            .ok_or_else(|| AppError::Validation("Invalid UTC offset".to_string())),
        None => Ok(config.default_offset()),
    }
}

fn today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// GET /api/v1/plans
pub async fn handle_list_plans(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
) -> Result<Json<Vec<PlanWithItems>>, AppError> {
    let data = state.data.for_session(&session);
    let plans = queries::list_plans(data.as_ref(), &scope, &session).await?;
    Ok(Json(plans))
}

/// GET /api/v1/plans/agenda
pub async fn handle_agenda(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Query(params): Query<AgendaParams>,
) -> Result<Json<AgendaResponse>, AppError> {
    let offset = resolve_offset(&state.config, params.utc_offset_minutes)?;
    let date = params.date.unwrap_or_else(|| today(offset));

    let data = state.data.for_session(&session);
    let plans = queries::list_plans(data.as_ref(), &scope, &session).await?;
    Ok(Json(AgendaResponse {
        date,
        items: agenda_for_date(&plans, date, offset),
    }))
}

/// POST /api/v1/plans
pub async fn handle_create_plan(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<CreatedPlan>), AppError> {
    req.validate()?;
    let offset = resolve_offset(&state.config, req.utc_offset_minutes)?;
    let date = req.date.unwrap_or_else(|| today(offset));
    let start = day_start(date, offset)
        .ok_or_else(|| anyhow::anyhow!("no 09:00 on {date} at {offset}"))?;

    let ticket = state
        .submissions
        .begin(session.user_id, "create_plan", req.name.trim())?;
    let data = state.data.for_session(&session);
    let handle = scope.handle();
    let user_id = session.user_id;

    // The task outlives this handler if the client goes away; it then sees
    // the scope cancelled and cleans up after itself.
    let task = tokio::spawn(async move {
        let _ticket = ticket;
        compose::create_plan(data, handle, user_id, req.name, req.places, start).await
    });

    let created = task
        .await
        .map_err(|e| anyhow::anyhow!("plan creation task failed: {e}"))??;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/plans/:id
pub async fn handle_get_plan(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanWithItems>, AppError> {
    let data = state.data.for_session(&session);
    let plan = queries::get_plan(data.as_ref(), &scope, &session, id).await?;
    Ok(Json(plan))
}

/// GET /api/v1/plans/:id/share
pub async fn handle_share_plan(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(id): Path<Uuid>,
    Query(params): Query<OffsetParams>,
) -> Result<Json<ShareMessage>, AppError> {
    let offset = resolve_offset(&state.config, params.utc_offset_minutes)?;
    let data = state.data.for_session(&session);
    let plan = queries::get_plan(data.as_ref(), &scope, &session, id).await?;

    Ok(Json(ShareMessage {
        message: share_text(&plan, offset),
        title: plan.plan.name,
    }))
}

/// DELETE /api/v1/plans/:id
pub async fn handle_delete_plan(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let data = state.data.for_session(&session);
    queries::delete_plan(data.as_ref(), &scope, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
