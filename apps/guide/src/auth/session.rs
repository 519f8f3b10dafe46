use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::Session;
use crate::errors::AppError;
use crate::state::AppState;

/// The token of a `Bearer` credential. The scheme name is matched without
/// regard to case.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim_start().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolves the `Authorization: Bearer <token>` header into a `Session`.
///
/// Handlers that only personalise their output take `Option<Session>`; a
/// missing or rejected token then simply yields `None`.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        state.auth.session_for_token(token).await.map_err(|e| {
            if e.is_credential_failure() {
                AppError::Unauthorized
            } else {
                AppError::Auth {
                    message: "Failed to verify session",
                    source: e,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::data_client::memory::MemoryDataClient;
    use crate::testing::{app, TOKEN};

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }

    #[tokio::test]
    async fn test_lowercase_scheme_reaches_session_routes() {
        let data = MemoryDataClient::new();
        let request = Request::builder()
            .uri("/api/v1/notifications")
            .header("authorization", format!("bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap();

        let response = app(&data, Uuid::new_v4()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
