use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::account::AccountId;
use crate::config::RetentionConfig;
use crate::database::models::{Customer, CustomerStatus};

use super::percentage;

const HEALTH_BUCKETS: [(u8, u8); 5] = [(0, 19), (20, 39), (40, 59), (60, 79), (80, 100)];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskCustomer {
    pub id: Uuid,
    pub account_id: AccountId,
    pub name: String,
    pub status: CustomerStatus,
    pub health_score: Option<f64>,
    pub mrr: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthBucket {
    pub label: String,
    pub min: u8,
    pub max: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionAnalysis {
    pub account_id: AccountId,
    pub total_customers: usize,
    pub retained_customers: usize,
    pub churned_customers: usize,
    pub retention_rate: f64,
    pub churn_rate: f64,
    pub mrr_at_risk: Decimal,
    pub at_risk_count: usize,
    /// Most urgent first, capped at the configured list size.
    pub at_risk_customers: Vec<AtRiskCustomer>,
    /// Live customers by health score; unscored customers are counted separately.
    pub health_distribution: Vec<HealthBucket>,
    pub unscored_customers: usize,
}

/// A live customer is at risk when flagged so, or when their health score is
/// below the threshold.
pub fn is_at_risk(customer: &Customer, threshold: f64) -> bool {
    !customer.is_churned()
        && (customer.status == CustomerStatus::AtRisk || customer.health_score.is_some_and(|s| s < threshold))
}

pub fn analyze(account_id: AccountId, customers: &[Customer], config: &RetentionConfig) -> RetentionAnalysis {
    let churned = customers.iter().filter(|c| c.is_churned()).count();
    let live: Vec<&Customer> = customers.iter().filter(|c| !c.is_churned()).collect();

    let mut at_risk: Vec<&Customer> = live
        .iter()
        .copied()
        .filter(|c| is_at_risk(c, config.at_risk_threshold))
        .collect();
    at_risk.sort_by(|a, b| urgency(a, b));

    let mrr_at_risk = at_risk.iter().map(|c| c.mrr).sum::<Decimal>();
    let at_risk_count = at_risk.len();

    let health_distribution = HEALTH_BUCKETS
        .iter()
        .map(|&(min, max)| HealthBucket {
            label: format!("{}-{}", min, max),
            min,
            max,
            count: live
                .iter()
                .filter_map(|c| c.health_score)
                .filter(|s| bucket_contains(*s, min, max))
                .count(),
        })
        .collect();

    RetentionAnalysis {
        account_id,
        total_customers: customers.len(),
        retained_customers: live.len(),
        churned_customers: churned,
        retention_rate: percentage(live.len() as f64, customers.len() as f64),
        churn_rate: percentage(churned as f64, customers.len() as f64),
        mrr_at_risk,
        at_risk_count,
        at_risk_customers: at_risk
            .into_iter()
            .take(config.at_risk_list_size)
            .map(|c| AtRiskCustomer {
                id: c.id,
                account_id: c.account_id,
                name: c.name.clone(),
                status: c.status,
                health_score: c.health_score,
                mrr: c.mrr,
            })
            .collect(),
        health_distribution,
        unscored_customers: live.iter().filter(|c| c.health_score.is_none()).count(),
    }
}

// Lowest score first (unscored before scored), then highest MRR, then name.
fn urgency(a: &Customer, b: &Customer) -> Ordering {
    let score = |c: &Customer| c.health_score.unwrap_or(f64::NEG_INFINITY);
    score(a)
        .partial_cmp(&score(b))
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.mrr.cmp(&a.mrr))
        .then_with(|| a.name.cmp(&b.name))
}

fn bucket_contains(score: f64, min: u8, max: u8) -> bool {
    let score = score.clamp(0.0, 100.0);
    // Fractional scores between buckets (19.5) fall into the lower one.
    score >= f64::from(min) && score < f64::from(max) + 1.0
}
