use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::filter::Filter;

use super::backend::Backend;
use super::client::DatabaseError;

/// Identity a query runs under: the database role plus the full claim set.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestClaims {
    pub role: String,
    pub claims: Value,
}

impl RequestClaims {
    pub fn from_claims(claims: Value) -> Self {
        let role = claims
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("anon")
            .to_string();
        Self { role, claims }
    }
}

/// Database handle bound to a single caller.
///
/// Created per request; nothing about one caller's identity is stored on the
/// shared [`super::DatabaseClient`].
#[derive(Clone)]
pub struct SessionClient {
    backend: Option<Arc<dyn Backend>>,
    claims: RequestClaims,
    user_id: Option<Uuid>,
}

impl SessionClient {
    pub(crate) fn new(backend: Option<Arc<dyn Backend>>, claims: RequestClaims, user_id: Option<Uuid>) -> Self {
        Self {
            backend,
            claims,
            user_id,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn claims(&self) -> &RequestClaims {
        &self.claims
    }

    fn backend(&self) -> Result<&dyn Backend, DatabaseError> {
        self.backend.as_deref().ok_or(DatabaseError::NotConfigured)
    }

    pub async fn select(&self, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        self.backend()?.select(&self.claims, filter).await
    }

    pub async fn select_as<T: DeserializeOwned>(&self, filter: &Filter) -> Result<Vec<T>, DatabaseError> {
        self.select(filter)
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| DatabaseError::Decode {
                    table: filter.table_name().to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.backend()?.ping(&self.claims).await
    }
}
