use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{public_claims, Session};
use crate::config::DatabaseConfig;
use crate::filter::FilterError;

use super::backend::{Backend, PgBackend};
use super::session::{RequestClaims, SessionClient};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database is not configured")]
    NotConfigured,

    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] FilterError),

    #[error("Failed to decode {table} row: {message}")]
    Decode { table: String, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Process-wide handle to the hosted database.
///
/// Built once from config and cloned into request state. When credentials are
/// missing the handle is still constructed, but every query through it fails
/// with [`DatabaseError::NotConfigured`].
#[derive(Clone)]
pub struct DatabaseClient {
    backend: Option<Arc<dyn Backend>>,
    public: RequestClaims,
}

impl DatabaseClient {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let (url, anon_key) = match (config.url.as_deref(), config.anon_key.as_deref()) {
            (Some(url), Some(key)) => (url, key),
            (url, key) => {
                let mut missing = vec![];
                if url.is_none() {
                    missing.push("SUPABASE_URL");
                }
                if key.is_none() {
                    missing.push("SUPABASE_ANON_KEY");
                }
                warn!(
                    missing = %missing.join(", "),
                    "Database credentials are missing; database queries will fail until they are set"
                );
                return Self::unconfigured();
            }
        };

        let endpoint = match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => parsed,
            Ok(parsed) => {
                warn!(scheme = %parsed.scheme(), "Database URL is not a postgres endpoint; database queries will fail");
                return Self::unconfigured();
            }
            Err(e) => {
                warn!(error = %e, "Database URL could not be parsed; database queries will fail");
                return Self::unconfigured();
            }
        };

        match PgBackend::connect_lazy(url, config) {
            Ok(backend) => {
                info!(
                    host = endpoint.host_str().unwrap_or("unknown"),
                    max_connections = config.max_connections,
                    "Database client configured"
                );
                Self {
                    backend: Some(Arc::new(backend)),
                    public: RequestClaims::from_claims(public_claims(Some(anon_key))),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to create database pool; database queries will fail");
                Self::unconfigured()
            }
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            public: RequestClaims::from_claims(public_claims(None)),
        }
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend: Some(backend),
            public: RequestClaims::from_claims(public_claims(None)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Public client: queries run under the anon key's claims.
    pub fn anonymous(&self) -> SessionClient {
        SessionClient::new(self.backend.clone(), self.public.clone(), None)
    }

    /// Request-scoped client: queries run under the caller's own claims so
    /// row-level security sees who is asking.
    pub fn for_session(&self, session: &Session) -> SessionClient {
        let claims = RequestClaims {
            role: session.role.clone(),
            claims: session.claims().clone(),
        };
        SessionClient::new(self.backend.clone(), claims, Some(session.user_id))
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.anonymous().ping().await
    }
}
