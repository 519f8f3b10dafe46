use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::Session;
use crate::data_client::{decode_row, Table};
use crate::errors::{AppError, OrScreen};
use crate::models::user::User;
use crate::scope::RequestScope;
use crate::state::AppState;

const UPDATE_PROFILE: &str = "Failed to update profile";

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
}

/// PUT /api/v1/profile
/// A blank username clears it.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let data = state.data.for_session(&session);
    let row = scope
        .run(data.upsert_row(
            Table::Users,
            json!({
                "id": session.user_id,
                "username": username,
                "updated_at": Utc::now(),
            }),
        ))
        .await?
        .or_screen(UPDATE_PROFILE)?;

    tracing::info!(user_id = %session.user_id, "Profile updated");
    Ok(Json(decode_row(row).or_screen(UPDATE_PROFILE)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use crate::data_client::memory::MemoryDataClient;
    use crate::data_client::Table;
    use crate::testing::{app, call, TOKEN};

    #[tokio::test]
    async fn test_update_creates_then_clears_username() {
        let me = Uuid::new_v4();
        let data = MemoryDataClient::new();

        let (status, body) = call(
            app(&data, me),
            "PUT",
            "/api/v1/profile",
            Some(TOKEN),
            Some(json!({ "username": " amal " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "amal");
        assert_eq!(body["id"], json!(me));

        let (_, body) = call(
            app(&data, me),
            "PUT",
            "/api/v1/profile",
            Some(TOKEN),
            Some(json!({ "username": "" })),
        )
        .await;
        assert!(body["username"].is_null());
        assert_eq!(data.rows(Table::Users).len(), 1);
    }

    #[tokio::test]
    async fn test_update_failure_reports_static_message() {
        let data = MemoryDataClient::new();
        data.fail_on("upsert_row", Table::Users);
        let (status, body) = call(
            app(&data, Uuid::new_v4()),
            "PUT",
            "/api/v1/profile",
            Some(TOKEN),
            Some(json!({ "username": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["message"], "Failed to update profile");
    }
}
