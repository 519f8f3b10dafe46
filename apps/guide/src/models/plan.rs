use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::place::Place;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub place_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub duration_minutes: u32,
    pub order: i32,
}

/// Insert payload for `plans`.
#[derive(Debug, Serialize)]
pub struct NewPlan<'a> {
    pub user_id: Uuid,
    pub name: &'a str,
}

/// Insert payload for `plan_items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlanItem {
    pub plan_id: Uuid,
    pub place_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub duration_minutes: u32,
    pub order: i32,
}

/// A plan item joined with the place it visits. `place` is `None` when the
/// place row has since been removed from the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct PlanStop {
    #[serde(flatten)]
    pub item: PlanItem,
    pub place: Option<Place>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanWithItems {
    #[serde(flatten)]
    pub plan: Plan,
    /// Sorted by `scheduled_for`.
    pub items: Vec<PlanStop>,
}
