use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_row, decode_rows, decode_single, Query, Table};
use crate::errors::{AppError, OrScreen};
use crate::models::notification::Notification;
use crate::scope::RequestScope;
use crate::state::AppState;

const LOAD_NOTIFICATIONS: &str = "Failed to load notifications";
const MARK_READ: &str = "Failed to update notification";

/// GET /api/v1/notifications
/// Newest first.
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
) -> Result<Json<Vec<Notification>>, AppError> {
    let data = state.data.for_session(&session);
    let query = Query::new()
        .eq("user_id", json!(session.user_id))
        .order_by("created_at", false);
    let rows = scope
        .run(data.fetch_rows(Table::Notifications, query))
        .await?
        .or_screen(LOAD_NOTIFICATIONS)?;
    Ok(Json(decode_rows(rows).or_screen(LOAD_NOTIFICATIONS)?))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let data = state.data.for_session(&session);

    // Only the recipient may mark a notification.
    let owned = Query::new()
        .eq("id", json!(id))
        .eq("user_id", json!(session.user_id))
        .limit(1);
    let rows = scope
        .run(data.fetch_rows(Table::Notifications, owned))
        .await?
        .or_screen(MARK_READ)?;
    decode_single::<Notification>(Table::Notifications, rows).or_screen(MARK_READ)?;

    let row = scope
        .run(data.update_row(Table::Notifications, id, json!({ "read": true })))
        .await?
        .or_screen(MARK_READ)?;
    Ok(Json(decode_row(row).or_screen(MARK_READ)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::data_client::memory::MemoryDataClient;
    use crate::data_client::Table;
    use crate::testing::{app, call, TOKEN};

    fn notification(user: Uuid, kind: &str, at: &str, data: serde_json::Value) -> serde_json::Value {
        json!({ "id": Uuid::new_v4(), "user_id": user, "type": kind,
                "created_at": at, "read": false, "data": data })
    }

    #[tokio::test]
    async fn test_notifications_are_own_and_newest_first() {
        let me = Uuid::new_v4();
        let data = MemoryDataClient::new();
        data.seed(
            Table::Notifications,
            vec![
                notification(
                    me,
                    "follow",
                    "2024-06-01T10:00:00Z",
                    json!({ "user": { "id": Uuid::new_v4(), "username": "sara" } }),
                ),
                notification(me, "like", "2024-06-03T10:00:00Z", json!(null)),
                notification(Uuid::new_v4(), "plan", "2024-06-04T10:00:00Z", json!({})),
            ],
        );

        let (status, body) = call(app(&data, me), "GET", "/api/v1/notifications", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["type"], "like");
        assert_eq!(list[1]["data"]["user"]["username"], "sara");
    }

    #[tokio::test]
    async fn test_mark_read_sets_flag() {
        let me = Uuid::new_v4();
        let data = MemoryDataClient::new();
        let row = notification(me, "review", "2024-06-01T10:00:00Z", json!({}));
        let id = row["id"].clone();
        data.seed(Table::Notifications, vec![row]);

        let uri = format!("/api/v1/notifications/{}/read", id.as_str().unwrap());
        let (status, body) = call(app(&data, me), "POST", &uri, Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["read"], true);
        assert_eq!(data.rows(Table::Notifications)[0]["read"], true);
    }

    #[tokio::test]
    async fn test_mark_read_on_someone_elses_notification_changes_nothing() {
        let data = MemoryDataClient::new();
        let row = notification(Uuid::new_v4(), "review", "2024-06-01T10:00:00Z", json!({}));
        let id = row["id"].clone();
        data.seed(Table::Notifications, vec![row]);

        let uri = format!("/api/v1/notifications/{}/read", id.as_str().unwrap());
        let (status, _) = call(app(&data, Uuid::new_v4()), "POST", &uri, Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(data.rows(Table::Notifications)[0]["read"], false);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_notification_is_not_found() {
        let data = MemoryDataClient::new();
        let (status, _) = call(
            app(&data, Uuid::new_v4()),
            "POST",
            &format!("/api/v1/notifications/{}/read", Uuid::new_v4()),
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
