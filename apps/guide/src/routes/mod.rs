pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::places::handlers as places;
use crate::plans::handlers as plans;
use crate::state::AppState;
use crate::{notifications, profile, reviews, saved, social};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/sign-in", post(auth::handle_sign_in))
        .route("/api/v1/auth/sign-up", post(auth::handle_sign_up))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route("/api/v1/auth/recover", post(auth::handle_recover))
        .route("/api/v1/auth/refresh", post(auth::handle_refresh))
        // Catalogue
        .route("/api/v1/discover", get(places::handle_discover))
        .route("/api/v1/places/search", get(places::handle_search))
        .route("/api/v1/places/map", get(places::handle_map))
        .route("/api/v1/categories/:slug", get(places::handle_category))
        .route("/api/v1/places/:id", get(places::handle_place_detail))
        .route(
            "/api/v1/places/:id/reviews",
            get(reviews::handle_list_reviews).post(reviews::handle_create_review),
        )
        // Saved places
        .route("/api/v1/saved", get(saved::handle_list_saved))
        .route("/api/v1/saved/:place_id", delete(saved::handle_remove_saved))
        .route(
            "/api/v1/saved/:place_id/toggle",
            post(saved::handle_toggle_saved),
        )
        // Plans
        .route(
            "/api/v1/plans",
            get(plans::handle_list_plans).post(plans::handle_create_plan),
        )
        .route("/api/v1/plans/agenda", get(plans::handle_agenda))
        .route(
            "/api/v1/plans/:id",
            get(plans::handle_get_plan).delete(plans::handle_delete_plan),
        )
        .route("/api/v1/plans/:id/share", get(plans::handle_share_plan))
        // Social
        .route("/api/v1/users/:id", get(social::handle_get_profile))
        .route("/api/v1/users/:id/follow", post(social::handle_toggle_follow))
        .route(
            "/api/v1/notifications",
            get(notifications::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::handle_mark_read),
        )
        .route("/api/v1/profile", put(profile::handle_update_profile))
        .with_state(state)
}
