/// GoTrue auth client: sign-in, sign-up, token refresh and token validation
/// against the hosted auth API.
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{AuthError, AuthProvider, AuthUser, Credentials, IssuedSession, Session, SignUpOutcome};

const AUTH_PATH: &str = "/auth/v1";

#[derive(Debug, Deserialize)]
struct GoTrueError {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
}

#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoTrueClient {
    pub fn new(client: Client, supabase_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}{}", supabase_url.trim_end_matches('/'), AUTH_PATH),
            api_key,
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .header("apikey", &self.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AuthError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoTrueError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        warn!("Auth API returned {}: {}", status, message);

        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<IssuedSession, AuthError> {
        let response = self
            .send(
                self.post("token")
                    .query(&[("grant_type", grant_type)])
                    .json(&body),
            )
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<IssuedSession, AuthError> {
        let session = self
            .token_grant(
                "password",
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;
        debug!("Signed in user {}", session.user.id);
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .send(self.post("signup").json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            })))
            .await?;
        let body: Value = response.json().await?;
        parse_sign_up(body)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, AuthError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.send(self.post("logout").bearer_auth(&session.access_token))
            .await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.send(self.post("recover").json(&json!({ "email": email })))
            .await?;
        Ok(())
    }

    async fn session_for_token(&self, access_token: &str) -> Result<Session, AuthError> {
        let response = self
            .send(
                self.client
                    .get(format!("{}/user", self.base_url))
                    .header("apikey", &self.api_key)
                    .bearer_auth(access_token),
            )
            .await?;
        let user: AuthUser = response.json().await?;
        Ok(Session {
            user_id: user.id,
            access_token: access_token.to_string(),
        })
    }
}

/// With e-mail confirmation enabled the sign-up response is the bare user
/// object; otherwise it is a full token grant.
fn parse_sign_up(body: Value) -> Result<SignUpOutcome, AuthError> {
    if body.get("access_token").is_some() {
        let session: IssuedSession = serde_json::from_value(body)?;
        return Ok(SignUpOutcome::SignedIn { session });
    }
    let user: AuthUser = match body.get("user") {
        Some(user) => serde_json::from_value(user.clone())?,
        None => serde_json::from_value(body)?,
    };
    Ok(SignUpOutcome::ConfirmationRequired { user })
}
