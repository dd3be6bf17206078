use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Trial,
    AtRisk,
    Churned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub account_id: AccountId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub status: CustomerStatus,
    #[serde(default)]
    pub plan: Option<String>,
    /// Monthly recurring revenue.
    #[serde(default)]
    pub mrr: Decimal,
    /// 0 to 100; absent until the first scoring run.
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub segment: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub churned_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn is_churned(&self) -> bool {
        self.status == CustomerStatus::Churned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_row_to_json_output() {
        let row = json!({
            "id": "6f1c1c7e-8c5a-4f4e-9d5e-0a1b2c3d4e5f",
            "account_id": "0b7e8f2a-1111-4c4c-8888-123456789abc",
            "name": "Acme",
            "email": null,
            "status": "at_risk",
            "mrr": 1250.50,
            "health_score": 42,
            "segment": "enterprise",
            "created_at": "2024-01-05T09:30:00.123456+00:00",
            "extra_column": true
        });

        let customer: Customer = serde_json::from_value(row).unwrap();
        assert_eq!(customer.status, CustomerStatus::AtRisk);
        assert_eq!(customer.mrr, Decimal::new(125050, 2));
        assert_eq!(customer.health_score, Some(42.0));
        assert!(customer.churned_at.is_none());
    }
}
