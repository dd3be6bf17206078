use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::account::{AccountId, AccountScope};
use crate::database::models::{Customer, CustomerStatus, Integration, IntegrationStatus, Report};
use crate::database::DatabaseError;
use crate::filter::FilterData;

use super::{percentage, round2};

pub const RECENT_REPORTS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOverview {
    pub account_id: AccountId,
    pub total_customers: usize,
    pub active_customers: usize,
    pub trial_customers: usize,
    pub at_risk_customers: usize,
    pub churned_customers: usize,
    /// Sum over customers that have not churned.
    pub total_mrr: Decimal,
    pub average_health_score: Option<f64>,
    pub churn_rate: f64,
    pub connected_integrations: usize,
    pub integration_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub overview: ReportOverview,
    pub recent_reports: Vec<Report>,
}

pub fn overview(account_id: AccountId, customers: &[Customer], integrations: &[Integration]) -> ReportOverview {
    let count = |status: CustomerStatus| customers.iter().filter(|c| c.status == status).count();

    let total_mrr = customers
        .iter()
        .filter(|c| !c.is_churned())
        .map(|c| c.mrr)
        .sum::<Decimal>();

    let scores: Vec<f64> = customers.iter().filter_map(|c| c.health_score).collect();
    let average_health_score = (!scores.is_empty()).then(|| round2(scores.iter().sum::<f64>() / scores.len() as f64));

    let churned = count(CustomerStatus::Churned);

    ReportOverview {
        account_id,
        total_customers: customers.len(),
        active_customers: count(CustomerStatus::Active),
        trial_customers: count(CustomerStatus::Trial),
        at_risk_customers: count(CustomerStatus::AtRisk),
        churned_customers: churned,
        total_mrr,
        average_health_score,
        churn_rate: percentage(churned as f64, customers.len() as f64),
        connected_integrations: integrations
            .iter()
            .filter(|i| i.status == IntegrationStatus::Connected)
            .count(),
        integration_errors: integrations
            .iter()
            .filter(|i| i.status == IntegrationStatus::Error)
            .count(),
    }
}

/// Fetch the three inputs concurrently and shape the summary.
pub async fn summarize(scope: &AccountScope) -> Result<ReportSummary, DatabaseError> {
    let recent = FilterData {
        order: Some(json!("created_at desc")),
        limit: Some(RECENT_REPORTS),
        ..Default::default()
    };

    let (customers, integrations, recent_reports) = futures::try_join!(
        scope.select::<Customer>(FilterData::default()),
        scope.select::<Integration>(FilterData::default()),
        scope.select::<Report>(recent),
    )?;

    Ok(ReportSummary {
        overview: overview(scope.account_id(), &customers, &integrations),
        recent_reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{customer, integration};
    use uuid::Uuid;

    #[test]
    fn overview_counts_statuses_and_excludes_churned_mrr() {
        let account = AccountId(Uuid::new_v4());
        let customers = vec![
            customer(account, "a", CustomerStatus::Active, 100, Some(90.0)),
            customer(account, "b", CustomerStatus::Trial, 0, None),
            customer(account, "c", CustomerStatus::AtRisk, 50, Some(30.0)),
            customer(account, "d", CustomerStatus::Churned, 70, Some(10.0)),
        ];
        let integrations = vec![
            integration(account, "hubspot", IntegrationStatus::Connected),
            integration(account, "stripe", IntegrationStatus::Error),
            integration(account, "slack", IntegrationStatus::Connected),
        ];

        let overview = overview(account, &customers, &integrations);
        assert_eq!(overview.total_customers, 4);
        assert_eq!(overview.active_customers, 1);
        assert_eq!(overview.trial_customers, 1);
        assert_eq!(overview.at_risk_customers, 1);
        assert_eq!(overview.churned_customers, 1);
        assert_eq!(overview.total_mrr, Decimal::from(150));
        assert_eq!(overview.average_health_score, Some(43.33));
        assert_eq!(overview.churn_rate, 25.0);
        assert_eq!(overview.connected_integrations, 2);
        assert_eq!(overview.integration_errors, 1);
    }

    #[test]
    fn empty_account_has_zeroed_overview() {
        let overview = overview(AccountId(Uuid::new_v4()), &[], &[]);
        assert_eq!(overview.total_customers, 0);
        assert_eq!(overview.total_mrr, Decimal::ZERO);
        assert_eq!(overview.average_health_score, None);
        assert_eq!(overview.churn_rate, 0.0);
    }
}
