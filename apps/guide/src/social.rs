//! Public user profiles, recent activity and following.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::Session;
use crate::data_client::{decode_rows, decode_single, DataClient, Filter, Query, Table};
use crate::errors::{AppError, OrScreen};
use crate::models::place::PlaceSummary;
use crate::models::user::{Activity, ActivityRow, Follow, UserProfile};
use crate::places::catalog;
use crate::scope::RequestScope;
use crate::state::AppState;

/// Activities shown on a profile.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

const LOAD_PROFILE: &str = "Failed to load profile";
const UPDATE_FOLLOW: &str = "Failed to update follow";

#[derive(Debug, Serialize)]
pub struct SocialProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Always `false` for anonymous callers.
    pub is_following: bool,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub user_id: Uuid,
    pub following: bool,
}

fn follow_filters(follower: Uuid, following: Uuid) -> Vec<Filter> {
    vec![
        Filter::eq("follower_id", json!(follower)),
        Filter::eq("following_id", json!(following)),
    ]
}

async fn is_following(
    data: &dyn DataClient,
    scope: &RequestScope,
    follower: Uuid,
    following: Uuid,
    message: &'static str,
) -> Result<bool, AppError> {
    let mut query = Query::new().limit(1);
    for filter in follow_filters(follower, following) {
        query = query.filter(filter);
    }
    let rows = scope
        .run(data.fetch_rows(Table::Follows, query))
        .await?
        .or_screen(message)?;
    let follows: Vec<Follow> = decode_rows(rows).or_screen(message)?;
    Ok(!follows.is_empty())
}

async fn recent_activities(
    data: &dyn DataClient,
    scope: &RequestScope,
    user_id: Uuid,
) -> Result<Vec<Activity>, AppError> {
    let query = Query::new()
        .eq("user_id", json!(user_id))
        .order_by("created_at", false)
        .limit(RECENT_ACTIVITY_LIMIT);
    let rows = scope
        .run(data.fetch_rows(Table::UserActivities, query))
        .await?
        .or_screen(LOAD_PROFILE)?;
    let activities: Vec<ActivityRow> = decode_rows(rows).or_screen(LOAD_PROFILE)?;

    let mut place_ids: Vec<Uuid> = activities.iter().map(|a| a.place_id).collect();
    place_ids.sort_unstable();
    place_ids.dedup();
    let places: HashMap<Uuid, PlaceSummary> =
        catalog::fetch_by_ids(data, scope, &place_ids, LOAD_PROFILE)
            .await?
            .iter()
            .map(|p| (p.id, PlaceSummary::from(p)))
            .collect();

    Ok(activities
        .into_iter()
        .map(|row| Activity {
            id: row.id,
            kind: row.kind,
            created_at: row.created_at,
            place: places.get(&row.place_id).cloned(),
        })
        .collect())
}

/// GET /api/v1/users/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Option<Session>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SocialProfile>, AppError> {
    let data = match &session {
        Some(session) => state.data.for_session(session),
        None => state.data.clone(),
    };

    let rows = scope
        .run(data.fetch_rows(
            Table::UserProfiles,
            Query::new().eq("id", json!(user_id)).limit(1),
        ))
        .await?
        .or_screen(LOAD_PROFILE)?;
    let profile: UserProfile = decode_single(Table::UserProfiles, rows).or_screen(LOAD_PROFILE)?;

    let is_following = match &session {
        Some(session) => {
            is_following(data.as_ref(), &scope, session.user_id, user_id, LOAD_PROFILE).await?
        }
        None => false,
    };
    let activities = recent_activities(data.as_ref(), &scope, user_id).await?;

    Ok(Json(SocialProfile {
        profile,
        is_following,
        activities,
    }))
}

/// POST /api/v1/users/:id/follow
pub async fn handle_toggle_follow(
    State(state): State<AppState>,
    scope: RequestScope,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FollowState>, AppError> {
    if user_id == session.user_id {
        return Err(AppError::Validation("You cannot follow yourself".to_string()));
    }
    let _ticket = state.submissions.begin(session.user_id, "follow", user_id)?;
    let data = state.data.for_session(&session);

    let following = is_following(data.as_ref(), &scope, session.user_id, user_id, UPDATE_FOLLOW).await?;
    if following {
        scope
            .run(data.delete_where(Table::Follows, follow_filters(session.user_id, user_id)))
            .await?
            .or_screen(UPDATE_FOLLOW)?;
    } else {
        let row = json!({ "follower_id": session.user_id, "following_id": user_id });
        scope
            .run(data.insert_row(Table::Follows, row))
            .await?
            .or_screen(UPDATE_FOLLOW)?;
    }

    tracing::debug!(%user_id, following = !following, "Follow toggled");
    Ok(Json(FollowState {
        user_id,
        following: !following,
    }))
}
