use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub place_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape returned by the `get_reviews_with_users` procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewReview<'a> {
    pub place_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub content: Option<&'a str>,
}
