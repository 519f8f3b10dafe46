use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::data_client::DataClient;
use crate::submissions::SubmissionGuard;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Anonymous data client. Use `data.for_session(&session)` when acting for a user.
    pub data: Arc<dyn DataClient>,
    pub auth: Arc<dyn AuthProvider>,
    pub config: Config,
    pub submissions: SubmissionGuard,
    /// Root of every request scope; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(data: Arc<dyn DataClient>, auth: Arc<dyn AuthProvider>) -> Self {
        AppState {
            data,
            auth,
            config: crate::config::test_config(),
            submissions: SubmissionGuard::new(),
            shutdown: CancellationToken::new(),
        }
    }
}
