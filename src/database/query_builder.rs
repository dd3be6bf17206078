use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use uuid::Uuid;

use crate::filter::{Filter, FilterError};

/// A filter compiled into a statement that yields one JSON object per row.
///
/// Rows come back as `row_to_json` so model decoding happens in serde, the
/// same way for every table, instead of through per-table `FromRow` impls.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl JsonQuery {
    pub fn from_filter(filter: &Filter) -> Result<Self, FilterError> {
        let inner = filter.to_sql()?;
        Ok(Self {
            sql: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        })
    }

    pub fn bind(&self) -> Query<'_, Postgres, PgArguments> {
        self.params
            .iter()
            .fold(sqlx::query(&self.sql), |q, param| bind_param(q, param))
    }
}

fn bind_param<'q>(q: Query<'q, Postgres, PgArguments>, v: &'q Value) -> Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => bind_string(q, s),
        Value::Array(_) | Value::Object(_) => q.bind(sqlx::types::Json(v)),
    }
}

/// Text parameters are sent typed: Postgres will not compare a `text`
/// parameter against `uuid`, `timestamptz` or `date` columns implicitly.
fn bind_string<'q>(q: Query<'q, Postgres, PgArguments>, s: &'q str) -> Query<'q, Postgres, PgArguments> {
    match classify(s) {
        TextParam::Uuid(id) => q.bind(id),
        TextParam::Timestamp(ts) => q.bind(ts),
        TextParam::Date(date) => q.bind(date),
        TextParam::Text => q.bind(s),
    }
}

#[derive(Debug, PartialEq)]
enum TextParam {
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Text,
}

fn classify(s: &str) -> TextParam {
    if let Ok(id) = Uuid::parse_str(s) {
        return TextParam::Uuid(id);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return TextParam::Timestamp(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return TextParam::Date(date);
    }
    TextParam::Text
}
