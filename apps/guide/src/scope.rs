//! Request scope: ties in-flight remote calls to the lifetime of the request
//! that started them.
//!
//! Each scope owns a child of the process shutdown token. Dropping the scope
//! (the handler finished, or the client went away and axum dropped the handler
//! future) cancels the token, so work that outlives the handler, such as a
//! spawned plan composition, observes the cancellation and discards its result.

use std::future::Future;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use thiserror::Error;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("scope cancelled")]
pub struct Cancelled;

pub struct RequestScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestScope {
    pub fn child_of(parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// A handle for work handed off to a spawned task. It is cancelled when
    /// this scope ends.
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            token: self.token.clone(),
        }
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        run_until_cancelled(&self.token, fut).await
    }
}

/// Cloneable view of a `RequestScope`. Does not keep the scope alive.
#[derive(Clone)]
pub struct ScopeHandle {
    token: CancellationToken,
}

impl ScopeHandle {
    /// `Err(Cancelled)` once the scope has ended.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        run_until_cancelled(&self.token, fut).await
    }
}

async fn run_until_cancelled<F: Future>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestScope {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestScope::child_of(&state.shutdown))
    }
}
