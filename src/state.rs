use std::sync::Arc;

use crate::auth::SessionVerifier;
use crate::config::AppConfig;
use crate::database::DatabaseClient;

/// Process-wide state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseClient,
    pub sessions: Arc<SessionVerifier>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Self {
        let db = DatabaseClient::from_config(&config.database);
        Self::new(config, db)
    }

    pub fn new(config: AppConfig, db: DatabaseClient) -> Self {
        let sessions = Arc::new(SessionVerifier::from_config(&config.session));
        Self {
            config: Arc::new(config),
            db,
            sessions,
        }
    }
}
