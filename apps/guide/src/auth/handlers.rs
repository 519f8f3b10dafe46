use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::{Credentials, IssuedSession, Session, SignUpOutcome};
use crate::errors::{AppError, OrScreen};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Trims the e-mail and checks both fields are present. Passwords are passed
/// through untouched.
fn checked_credentials(credentials: Credentials) -> Result<Credentials, AppError> {
    let email = credentials.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if credentials.password.trim().is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(Credentials {
        email,
        password: credentials.password,
    })
}

/// POST /api/v1/auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<Json<IssuedSession>, AppError> {
    let credentials = checked_credentials(req)?;
    let session = state
        .auth
        .sign_in(&credentials)
        .await
        .or_screen("Invalid email or password")?;

    tracing::info!(user_id = %session.user.id, "User signed in");
    Ok(Json(session))
}

/// POST /api/v1/auth/sign-up
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<SignUpOutcome>), AppError> {
    let credentials = checked_credentials(req)?;
    let outcome = state
        .auth
        .sign_up(&credentials)
        .await
        .or_screen("Failed to create account")?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    session: Session,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .sign_out(&session)
        .await
        .or_screen("Failed to sign out")?;
    tracing::info!(user_id = %session.user_id, "User signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/recover
pub async fn handle_recover(
    State(state): State<AppState>,
    Json(req): Json<RecoverRequest>,
) -> Result<StatusCode, AppError> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    state
        .auth
        .send_password_reset(email)
        .await
        .or_screen("Failed to send reset email")?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/auth/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<IssuedSession>, AppError> {
    let session = state
        .auth
        .refresh(&req.refresh_token)
        .await
        .or_screen("Your session has expired")?;
    Ok(Json(session))
}
