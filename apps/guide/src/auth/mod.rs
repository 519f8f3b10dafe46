//! Authentication: sessions are issued and validated by the hosted auth API.
//!
//! The service never inspects credentials. A request's `Session` is resolved
//! from its bearer token by the `AuthProvider` and then passed explicitly to
//! whatever needs to act for that user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod gotrue;
pub mod handlers;
mod session;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Auth API rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AuthError {
    /// True when the auth API refused the credentials or token itself.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AuthError::Rejected { status, .. } if (400..500).contains(status))
    }
}

/// The signed-in user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens handed back to the client after sign-in, sign-up or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: AuthUser,
}

/// Sign-up either signs the user in immediately or waits for e-mail confirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpOutcome {
    SignedIn { session: IssuedSession },
    ConfirmationRequired { user: AuthUser },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<IssuedSession, AuthError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Resolves a bearer token to the user it was issued for.
    async fn session_for_token(&self, access_token: &str) -> Result<Session, AuthError>;
}
