use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::data_client::{decode_row, decode_rows, encode, DataClient, Filter, Table};
use crate::errors::{AppError, OrScreen};
use crate::itinerary::{
    build_itinerary, itinerary_end, ScheduledStop, SelectedPlace, MAX_VISIT_MINUTES,
};
use crate::models::plan::{NewPlan, NewPlanItem, Plan, PlanItem};
use crate::scope::ScopeHandle;

const CREATE_PLAN: &str = "Failed to create plan";
const PLAN_TOO_LONG: &str = "Plan is too long";

/// Body of `POST /api/v1/plans`.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub places: Vec<SelectedPlace>,
    /// Day the plan is for; today in the caller's offset when absent.
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl CreatePlanRequest {
    /// Checks run before anything reaches the store.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Please enter a plan name".to_string()));
        }
        if self.places.is_empty() {
            return Err(AppError::Validation(
                "Please add at least one place to your plan".to_string(),
            ));
        }
        if self.places.iter().any(|p| p.duration.0 > MAX_VISIT_MINUTES) {
            return Err(AppError::Validation(
                "A visit can last at most 24 hours".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPlan {
    #[serde(flatten)]
    pub plan: Plan,
    pub items: Vec<PlanItem>,
    /// When the last stop finishes.
    pub ends_at: Option<DateTime<Utc>>,
}

/// Lays the selection out from `day_start`, writes the plan row, then writes
/// the items.
///
/// Runs detached from the request: the handler spawns it and `scope` only
/// reports whether the request is still wanted. The plan insert itself is not
/// raced against the scope, so once it returns the row's id is known; any
/// failure or cancellation after that point deletes the plan again.
pub async fn create_plan(
    data: Arc<dyn DataClient>,
    scope: ScopeHandle,
    user_id: Uuid,
    name: String,
    selection: Vec<SelectedPlace>,
    day_start: DateTime<FixedOffset>,
) -> Result<CreatedPlan, AppError> {
    let stops = build_itinerary(&selection, &day_start)
        .ok_or_else(|| AppError::Validation(PLAN_TOO_LONG.to_string()))?;
    let payload = encode(&NewPlan {
        user_id,
        name: name.trim(),
    })
    .or_screen(CREATE_PLAN)?;

    scope.check()?;
    let row = data
        .insert_row(Table::Plans, payload)
        .await
        .or_screen(CREATE_PLAN)?;

    let Some(plan_id) = row
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok())
    else {
        tracing::error!("Plan insert returned a row without an id: {row}");
        return Err(AppError::Internal(anyhow::anyhow!(
            "plan row returned without an id"
        )));
    };

    match write_items(data.as_ref(), &scope, row, stops).await {
        Ok(created) => {
            tracing::info!(%plan_id, items = created.items.len(), "Plan created");
            Ok(created)
        }
        Err(e) => {
            match &e {
                AppError::Cancelled => tracing::info!(%plan_id, "Plan creation cancelled"),
                other => tracing::warn!(%plan_id, "Plan creation failed: {other}"),
            }
            discard_plan(data.as_ref(), plan_id).await;
            Err(e)
        }
    }
}

/// Everything after the plan row exists. An error here leaves a plan that the
/// caller has to discard.
async fn write_items(
    data: &dyn DataClient,
    scope: &ScopeHandle,
    row: Value,
    stops: Vec<ScheduledStop>,
) -> Result<CreatedPlan, AppError> {
    scope.check()?;
    let plan: Plan = decode_row(row).or_screen(CREATE_PLAN)?;

    let ends_at = itinerary_end(&stops);
    let rows = stops
        .into_iter()
        .map(|stop| {
            encode(&NewPlanItem {
                plan_id: plan.id,
                place_id: stop.place_id,
                scheduled_for: stop.scheduled_for,
                duration_minutes: stop.duration_minutes,
                order: stop.order,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .or_screen(CREATE_PLAN)?;

    let inserted = scope
        .run(data.insert_rows(Table::PlanItems, rows))
        .await?
        .or_screen(CREATE_PLAN)?;
    let items: Vec<PlanItem> = decode_rows(inserted).or_screen(CREATE_PLAN)?;

    Ok(CreatedPlan {
        plan,
        items,
        ends_at,
    })
}

/// Removes a half-written plan. Runs outside the request scope so it still
/// happens after cancellation. Failures are logged only.
async fn discard_plan(data: &dyn DataClient, plan_id: Uuid) {
    let items = data
        .delete_where(Table::PlanItems, vec![Filter::eq("plan_id", json!(plan_id))])
        .await;
    let plan = data.delete_row(Table::Plans, plan_id).await;

    if let Err(e) = items.and(plan) {
        tracing::error!(%plan_id, "Failed to discard partial plan: {e}");
    }
}
