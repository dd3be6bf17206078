// handlers/mod.rs - Route handlers
//
// Public: `/` and `/health`.
// Account-scoped: everything under `/api`, behind the session and account
// middleware; handlers receive an `AccountContext` extension and issue every
// query through its `AccountScope`.

pub mod customers;
pub mod guides;
pub mod integrations;
pub mod metrics;
pub mod public;
pub mod reports;
pub mod retention;
pub mod settings;

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::FilterData;

/// `Query` whose rejection is rendered through the API error envelope.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Paging and ordering parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    pub order: Option<String>,
}

impl PageQuery {
    /// Filter data for a list query: equality conditions from `conditions`
    /// (unset entries skipped), a limit defaulting to and capped by config,
    /// and an order restricted to the `sortable` columns.
    pub fn to_filter_data(
        &self,
        api: &ApiConfig,
        conditions: &[(&str, Option<&str>)],
        default_order: &str,
        sortable: &[&str],
    ) -> Result<FilterData, ApiError> {
        let limit = match self.limit {
            Some(limit) if limit < 0 => return Err(ApiError::bad_request("limit must not be negative")),
            Some(limit) => limit.min(api.max_limit),
            None => api.default_limit,
        };
        if matches!(self.offset, Some(offset) if offset < 0) {
            return Err(ApiError::bad_request("offset must not be negative"));
        }

        let mut where_clause = Map::new();
        for (column, value) in conditions {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                where_clause.insert(column.to_string(), json!(value));
            }
        }

        let order = self
            .order
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(default_order);
        for info in FilterOrder::validate_and_parse(&json!(order))? {
            if !sortable.contains(&info.column.as_str()) {
                return Err(ApiError::bad_request(format!("cannot order by '{}'", info.column)));
            }
        }

        Ok(FilterData {
            select: None,
            where_clause: (!where_clause.is_empty()).then_some(Value::Object(where_clause)),
            order: Some(json!(order)),
            limit: Some(limit),
            offset: self.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    const SORTABLE: &[&str] = &["name", "created_at"];

    #[test]
    fn limit_defaults_and_caps() {
        let api = AppConfig::production().api;

        let data = PageQuery::default().to_filter_data(&api, &[], "name asc", SORTABLE).unwrap();
        assert_eq!(data.limit, Some(api.default_limit));
        assert_eq!(data.order, Some(json!("name asc")));
        assert!(data.where_clause.is_none());

        let query = PageQuery {
            limit: Some(api.max_limit + 500),
            ..Default::default()
        };
        let data = query.to_filter_data(&api, &[], "name asc", SORTABLE).unwrap();
        assert_eq!(data.limit, Some(api.max_limit));
    }

    #[test]
    fn skips_unset_conditions() {
        let api = AppConfig::development().api;
        let data = PageQuery::default()
            .to_filter_data(
                &api,
                &[("status", Some("active")), ("segment", None), ("plan", Some(""))],
                "name asc",
                SORTABLE,
            )
            .unwrap();
        assert_eq!(data.where_clause, Some(json!({ "status": "active" })));
    }

    #[test]
    fn rejects_negative_paging() {
        let api = AppConfig::development().api;
        let query = PageQuery {
            offset: Some(-1),
            ..Default::default()
        };
        assert!(query.to_filter_data(&api, &[], "name asc", SORTABLE).is_err());
    }

    #[test]
    fn order_is_limited_to_sortable_columns() {
        let api = AppConfig::development().api;
        let query = PageQuery {
            order: Some("created_at desc, name".to_string()),
            ..Default::default()
        };
        assert!(query.to_filter_data(&api, &[], "name asc", SORTABLE).is_ok());

        let query = PageQuery {
            order: Some("no_such_column desc".to_string()),
            ..Default::default()
        };
        let err = query.to_filter_data(&api, &[], "name asc", SORTABLE).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
