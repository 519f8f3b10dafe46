//! In-flight de-duplication for mutating actions.
//!
//! A double-pressed "save" or "create plan" arrives as two overlapping
//! requests. The first one to start holds a ticket for its key; an identical
//! request arriving before that ticket is dropped is refused with `Conflict`.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of one submission; releases its key on drop.
pub struct SubmissionTicket {
    key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `action` on `target` for `user_id`.
    pub fn begin(
        &self,
        user_id: Uuid,
        action: &str,
        target: impl std::fmt::Display,
    ) -> Result<SubmissionTicket, AppError> {
        let key = format!("{user_id}:{action}:{target}");
        if !self.in_flight.lock().insert(key.clone()) {
            tracing::info!(%user_id, action, "Duplicate submission rejected");
            return Err(AppError::Conflict(
                "This request is already being processed".to_string(),
            ));
        }

        Ok(SubmissionTicket {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

impl Drop for SubmissionTicket {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}
