use std::collections::HashMap;

use serde_json::json;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_rows, decode_single, DataClient, Filter, Query, Table};
use crate::errors::{AppError, OrScreen};
use crate::itinerary::share::sort_stops;
use crate::models::place::Place;
use crate::models::plan::{Plan, PlanItem, PlanStop, PlanWithItems};
use crate::places::catalog;
use crate::scope::RequestScope;

pub const LOAD_PLANS: &str = "Failed to load plans";
pub const LOAD_PLAN: &str = "Failed to load plan";
pub const DELETE_PLAN: &str = "Failed to delete plan";

/// Joins plans with their items and each item's place. Items come back
/// sorted by start time; plans keep their incoming order.
pub fn assemble(plans: Vec<Plan>, items: Vec<PlanItem>, places: Vec<Place>) -> Vec<PlanWithItems> {
    let places: HashMap<Uuid, Place> = places.into_iter().map(|p| (p.id, p)).collect();
    let mut by_plan: HashMap<Uuid, Vec<PlanStop>> = HashMap::new();
    for item in items {
        let place = places.get(&item.place_id).cloned();
        by_plan
            .entry(item.plan_id)
            .or_default()
            .push(PlanStop { item, place });
    }

    plans
        .into_iter()
        .map(|plan| {
            let mut items = by_plan.remove(&plan.id).unwrap_or_default();
            sort_stops(&mut items);
            PlanWithItems { plan, items }
        })
        .collect()
}

async fn items_for(
    data: &dyn DataClient,
    scope: &RequestScope,
    plan_ids: &[Uuid],
    message: &'static str,
) -> Result<(Vec<PlanItem>, Vec<Place>), AppError> {
    if plan_ids.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let query = Query::new().filter(Filter::any_of("plan_id", plan_ids.iter().map(|id| json!(id))));
    let rows = scope
        .run(data.fetch_rows(Table::PlanItems, query))
        .await?
        .or_screen(message)?;
    let items: Vec<PlanItem> = decode_rows(rows).or_screen(message)?;

    let mut place_ids: Vec<Uuid> = items.iter().map(|i| i.place_id).collect();
    place_ids.sort_unstable();
    place_ids.dedup();
    let places = catalog::fetch_by_ids(data, scope, &place_ids, message).await?;
    Ok((items, places))
}

/// Every plan owned by `session`, newest first.
pub async fn list_plans(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
) -> Result<Vec<PlanWithItems>, AppError> {
    let query = Query::new()
        .eq("user_id", json!(session.user_id))
        .order_by("created_at", false);
    let rows = scope
        .run(data.fetch_rows(Table::Plans, query))
        .await?
        .or_screen(LOAD_PLANS)?;
    let plans: Vec<Plan> = decode_rows(rows).or_screen(LOAD_PLANS)?;

    let ids: Vec<Uuid> = plans.iter().map(|p| p.id).collect();
    let (items, places) = items_for(data, scope, &ids, LOAD_PLANS).await?;
    Ok(assemble(plans, items, places))
}

/// Loads the plan row and checks that `session` owns it.
async fn owned_plan(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
    plan_id: Uuid,
    message: &'static str,
) -> Result<Plan, AppError> {
    let rows = scope
        .run(data.fetch_rows(Table::Plans, Query::new().eq("id", json!(plan_id)).limit(1)))
        .await?
        .or_screen(message)?;
    let plan: Plan = decode_single(Table::Plans, rows).or_screen(message)?;

    if plan.user_id != session.user_id {
        tracing::warn!(%plan_id, user_id = %session.user_id, "Plan access denied");
        return Err(AppError::Forbidden);
    }
    Ok(plan)
}

pub async fn get_plan(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
    plan_id: Uuid,
) -> Result<PlanWithItems, AppError> {
    let plan = owned_plan(data, scope, session, plan_id, LOAD_PLAN).await?;
    let (items, places) = items_for(data, scope, &[plan.id], LOAD_PLAN).await?;

    assemble(vec![plan], items, places)
        .pop()
        .ok_or_else(|| AppError::NotFound(LOAD_PLAN.to_string()))
}

/// Removes the plan's items, then the plan itself.
pub async fn delete_plan(
    data: &dyn DataClient,
    scope: &RequestScope,
    session: &Session,
    plan_id: Uuid,
) -> Result<(), AppError> {
    owned_plan(data, scope, session, plan_id, DELETE_PLAN).await?;

    scope
        .run(data.delete_where(Table::PlanItems, vec![Filter::eq("plan_id", json!(plan_id))]))
        .await?
        .or_screen(DELETE_PLAN)?;
    scope
        .run(data.delete_row(Table::Plans, plan_id))
        .await?
        .or_screen(DELETE_PLAN)?;

    tracing::info!(%plan_id, "Plan deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use crate::data_client::memory::MemoryDataClient;
    use crate::testing::{id_of, place_row};

    fn plan_row(user: Uuid, name: &str, created: &str) -> serde_json::Value {
        json!({ "id": Uuid::new_v4(), "user_id": user, "name": name,
                "created_at": created, "updated_at": created })
    }

    fn item_row(plan: Uuid, place: Uuid, hour: u32, order: i32) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "plan_id": plan,
            "place_id": place,
            "scheduled_for": Utc.with_ymd_and_hms(2024, 11, 2, hour, 0, 0).unwrap(),
            "duration_minutes": 60,
            "order": order
        })
    }

    fn session(user_id: Uuid) -> Session {
        Session {
            user_id,
            access_token: "t".into(),
        }
    }

    #[tokio::test]
    async fn test_list_plans_joins_items_and_places() {
        let user = Uuid::new_v4();
        let data = MemoryDataClient::new();
        let museum = place_row("Museum", "Cultural Sites", 4.0);
        let cafe = place_row("Cafe", "Restaurants & Cafes", 4.0);
        let older = plan_row(user, "Older", "2024-10-01T10:00:00Z");
        let newer = plan_row(user, "Newer", "2024-10-05T10:00:00Z");
        let not_mine = plan_row(Uuid::new_v4(), "Other", "2024-10-06T10:00:00Z");
        data.seed(
            Table::PlanItems,
            vec![
                item_row(id_of(&newer), id_of(&museum), 11, 1),
                item_row(id_of(&newer), id_of(&cafe), 9, 0),
                item_row(id_of(&older), Uuid::new_v4(), 9, 0),
            ],
        );
        data.seed(Table::Places, vec![museum, cafe]);
        data.seed(Table::Plans, vec![older, newer, not_mine]);
        let scope = RequestScope::child_of(&CancellationToken::new());

        let plans = list_plans(&data, &scope, &session(user)).await.unwrap();
        let names: Vec<&str> = plans.iter().map(|p| p.plan.name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);

        let stops: Vec<&str> = plans[0]
            .items
            .iter()
            .map(|s| s.place.as_ref().unwrap().name.as_str())
            .collect();
        assert_eq!(stops, vec!["Cafe", "Museum"]);
        assert!(plans[1].items[0].place.is_none());
    }

    #[tokio::test]
    async fn test_list_plans_without_plans_skips_item_lookup() {
        let data = MemoryDataClient::new();
        let scope = RequestScope::child_of(&CancellationToken::new());
        let plans = list_plans(&data, &scope, &session(Uuid::new_v4())).await.unwrap();
        assert!(plans.is_empty());
        assert_eq!(data.calls(), vec!["fetch_rows plans".to_string()]);
    }

    #[tokio::test]
    async fn test_get_plan_of_another_user_is_forbidden() {
        let data = MemoryDataClient::new();
        let plan = plan_row(Uuid::new_v4(), "Secret", "2024-10-01T10:00:00Z");
        let plan_id = id_of(&plan);
        data.seed(Table::Plans, vec![plan]);
        let scope = RequestScope::child_of(&CancellationToken::new());

        let err = get_plan(&data, &scope, &session(Uuid::new_v4()), plan_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_delete_plan_removes_items_then_plan() {
        let user = Uuid::new_v4();
        let data = MemoryDataClient::new();
        let plan = plan_row(user, "Trip", "2024-10-01T10:00:00Z");
        let plan_id = id_of(&plan);
        let other = plan_row(user, "Keep", "2024-10-01T10:00:00Z");
        data.seed(
            Table::PlanItems,
            vec![
                item_row(plan_id, Uuid::new_v4(), 9, 0),
                item_row(id_of(&other), Uuid::new_v4(), 9, 0),
            ],
        );
        data.seed(Table::Plans, vec![plan, other]);
        let scope = RequestScope::child_of(&CancellationToken::new());

        delete_plan(&data, &scope, &session(user), plan_id).await.unwrap();

        assert_eq!(data.rows(Table::Plans).len(), 1);
        assert_eq!(data.rows(Table::PlanItems).len(), 1);
        let calls = data.calls();
        let items_at = calls.iter().position(|c| c == "delete_where plan_items").unwrap();
        let plan_at = calls.iter().position(|c| c == "delete_row plans").unwrap();
        assert!(items_at < plan_at);
    }
}
