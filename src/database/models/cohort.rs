use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    /// First day of the signup month.
    pub cohort_month: NaiveDate,
    pub initial_customers: i64,
    /// Customers still active at the end of each period after signup.
    #[serde(default)]
    pub retained: Vec<i64>,
}
