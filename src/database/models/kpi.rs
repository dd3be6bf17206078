use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

/// One recorded value of a KPI; a key accumulates many over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    pub key: String,
    pub label: String,
    pub value: f64,
    #[serde(default)]
    pub previous_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
