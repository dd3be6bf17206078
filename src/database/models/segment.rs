use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub customer_count: i64,
    #[serde(default)]
    pub mrr: Decimal,
    /// Percentage, 0 to 100.
    #[serde(default)]
    pub churn_rate: f64,
}
