use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::clients::{generation::GenerationClient, identity::IdentityProvider};
use crate::config::Config;

/// Process-wide shared state: constructed once at startup and cloned into
/// each request. The pool and the collaborator clients are long-lived and
/// reused across requests.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub model: Arc<dyn GenerationClient>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

impl FromRef<AppState> for Arc<dyn GenerationClient> {
    fn from_ref(state: &AppState) -> Self {
        state.model.clone()
    }
}
