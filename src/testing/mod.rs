//! Test fixtures: an in-memory [`Backend`] seeded with several accounts, and
//! helpers to mint sessions and drive the router.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use crate::account::AccountId;
use crate::auth::{generate_jwt, Claims, Session, SessionVerifier};
use crate::config::AppConfig;
use crate::database::models::{Customer, CustomerStatus, Integration, IntegrationStatus};
use crate::database::{Backend, DatabaseClient, DatabaseError, RequestClaims, SessionClient};
use crate::filter::{Filter, SortDirection};
use crate::state::AppState;

pub const TEST_SECRET: &str = "retention-test-secret";

/// Tables as JSON rows, the same shape `row_to_json` produces.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<(String, RequestClaims)>>,
}

impl MemoryBackend {
    pub fn insert(&self, table: &str, row: Value) {
        self.tables.lock().unwrap().entry(table.to_string()).or_default().push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    /// Every query seen so far: table and the claims it ran under.
    pub fn calls(&self) -> Vec<(String, RequestClaims)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, claims: &RequestClaims, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        // Same validation path as the Postgres backend.
        filter.to_sql()?;
        self.calls
            .lock()
            .unwrap()
            .push((filter.table_name().to_string(), claims.clone()));

        let mut rows: Vec<Value> = self
            .rows(filter.table_name())
            .into_iter()
            .filter(|row| match filter.scope_condition() {
                Some(scope) => row.get(&scope.column) == Some(&scope.value),
                None => true,
            })
            .filter(|row| matches_where(row, filter.where_data()))
            .collect();

        rows.sort_by(|a, b| {
            filter
                .order_info()
                .iter()
                .map(|o| {
                    let ord = compare(&a[&o.column], &b[&o.column]);
                    match o.sort {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
        let limit = filter.limit_value().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn ping(&self, _claims: &RequestClaims) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Equality conditions only; that is all the handlers issue.
fn matches_where(row: &Value, where_data: Option<&Value>) -> bool {
    match where_data.and_then(Value::as_object) {
        Some(conditions) => conditions.iter().all(|(column, value)| row.get(column) == Some(value)),
        None => true,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Returns every row of the table, ignoring the filter, as a backend with a
/// broken row-level policy would.
pub struct LeakyBackend(pub Arc<MemoryBackend>);

#[async_trait]
impl Backend for LeakyBackend {
    async fn select(&self, _claims: &RequestClaims, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        Ok(self.0.rows(filter.table_name()))
    }

    async fn ping(&self, _claims: &RequestClaims) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestTenant {
    pub account_id: AccountId,
    pub user_id: Uuid,
}

pub struct Fixture {
    pub backend: Arc<MemoryBackend>,
    pub state: AppState,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.session.jwt_secret = Some(TEST_SECRET.to_string());
    config
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let backend = Arc::new(MemoryBackend::default());
        let state = AppState::new(config, DatabaseClient::with_backend(backend.clone()));
        Self { backend, state }
    }

    /// An account with one member and a small, fully populated data set.
    pub fn seed_account(&self, name: &str) -> TestTenant {
        let tenant = TestTenant {
            account_id: AccountId(Uuid::new_v4()),
            user_id: Uuid::new_v4(),
        };
        let account = tenant.account_id;
        self.add_membership(tenant.user_id, account, "2024-01-01T00:00:00Z");

        let customers = [
            ("Active", "active", Some(88), 500, "enterprise"),
            ("Trial", "trial", None, 0, "smb"),
            ("Risky", "at_risk", Some(31), 200, "smb"),
            ("Gone", "churned", Some(12), 100, "enterprise"),
        ];
        for (label, status, score, mrr, segment) in customers {
            self.backend.insert(
                "customers",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "name": format!("{} {}", name, label),
                    "email": format!("{}@{}.test", label.to_lowercase(), name.to_lowercase()),
                    "status": status,
                    "mrr": mrr,
                    "health_score": score,
                    "segment": segment,
                    "created_at": "2024-01-10T12:00:00+00:00",
                    "churned_at": if status == "churned" { json!("2024-04-01T00:00:00+00:00") } else { Value::Null }
                }),
            );
        }

        for (title, status, category, updated) in [
            ("Onboarding playbook", "published", "onboarding", "2024-03-01T00:00:00Z"),
            ("Renewal checklist", "draft", "renewals", "2024-03-05T00:00:00Z"),
        ] {
            self.backend.insert(
                "guides",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "title": format!("{}: {}", name, title),
                    "status": status,
                    "category": category,
                    "updated_at": updated
                }),
            );
        }

        for (provider, status) in [("hubspot", "connected"), ("stripe", "error")] {
            self.backend.insert(
                "integrations",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "provider": provider,
                    "status": status,
                    "error_message": if status == "error" { json!("token expired") } else { Value::Null },
                    "created_at": "2024-01-02T00:00:00Z"
                }),
            );
        }

        for (key, value, previous, recorded) in [
            ("nrr", json!(100.0), Value::Null, "2024-04-01T00:00:00Z"),
            ("nrr", json!(104.0), Value::Null, "2024-05-01T00:00:00Z"),
            ("churn_rate", json!(3.5), json!(4.0), "2024-05-01T00:00:00Z"),
        ] {
            self.backend.insert(
                "metric_kpis",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "key": key,
                    "label": key.replace('_', " "),
                    "value": value,
                    "previous_value": previous,
                    "unit": "%",
                    "recorded_at": recorded
                }),
            );
        }

        for (month, initial, retained) in [
            ("2024-01-01", 20, json!([20, 18, 15])),
            ("2024-02-01", 10, json!([10, 9])),
        ] {
            self.backend.insert(
                "metric_cohorts",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "cohort_month": month,
                    "initial_customers": initial,
                    "retained": retained
                }),
            );
        }

        for (segment, count, mrr, churn) in [("smb", 30, 4500, 6.5), ("enterprise", 5, 12000, 1.2)] {
            self.backend.insert(
                "metric_segments",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "name": segment,
                    "customer_count": count,
                    "mrr": mrr,
                    "churn_rate": churn
                }),
            );
        }

        for (title, created) in [("Q1 retention", "2024-04-02T00:00:00Z"), ("March churn", "2024-04-01T00:00:00Z")] {
            self.backend.insert(
                "reports",
                json!({
                    "id": Uuid::new_v4(),
                    "account_id": account,
                    "title": format!("{} {}", name, title),
                    "kind": "retention",
                    "period_start": "2024-01-01",
                    "period_end": "2024-03-31",
                    "created_at": created
                }),
            );
        }

        tenant
    }

    pub fn add_membership(&self, user_id: Uuid, account_id: AccountId, created_at: &str) {
        self.backend.insert(
            "account_members",
            json!({
                "user_id": user_id,
                "account_id": account_id,
                "role": "owner",
                "created_at": created_at
            }),
        );
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        let claims = Claims::new(
            user_id,
            Some(format!("{}@example.test", user_id.simple())),
            self.state.config.session.audience.clone(),
            Duration::hours(1),
        );
        generate_jwt(TEST_SECRET, &claims).unwrap()
    }

    pub fn cookie_for(&self, user_id: Uuid) -> String {
        format!("{}={}", self.state.config.session.cookie_name, self.token_for(user_id))
    }

    pub fn session_for(&self, user_id: Uuid) -> Session {
        SessionVerifier::from_config(&self.state.config.session)
            .verify(&self.token_for(user_id))
            .unwrap()
    }

    pub fn client_for(&self, user_id: Uuid) -> SessionClient {
        self.state.db.for_session(&self.session_for(user_id))
    }

    /// Drive the full router for one GET request.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        send(self.state.clone(), uri, cookie).await
    }
}

pub async fn send(state: AppState, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    let response = crate::app(state)
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn customer(account_id: AccountId, name: &str, status: CustomerStatus, mrr: i64, health_score: Option<f64>) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        account_id,
        name: name.to_string(),
        email: None,
        company: None,
        status,
        plan: None,
        mrr: Decimal::from(mrr),
        health_score,
        segment: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        last_active_at: None,
        churned_at: None,
    }
}

pub fn integration(account_id: AccountId, provider: &str, status: IntegrationStatus) -> Integration {
    Integration {
        id: Uuid::new_v4(),
        account_id,
        provider: provider.to_string(),
        status,
        last_synced_at: None,
        error_message: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}
