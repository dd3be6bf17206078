use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::account::AccountId;
use crate::database::models::{CohortRecord, KpiRecord};

use super::{percentage, round2};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub key: String,
    pub label: String,
    pub account_id: AccountId,
    pub value: f64,
    pub previous_value: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    pub unit: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Latest value per KPI key, compared against the value before it.
///
/// The comparison point is the row's own `previous_value` when recorded,
/// otherwise the next most recent row for the same key. Output is sorted by key.
pub fn latest_kpis(records: Vec<KpiRecord>) -> Vec<KpiSnapshot> {
    let mut by_key: BTreeMap<String, Vec<KpiRecord>> = BTreeMap::new();
    for record in records {
        by_key.entry(record.key.clone()).or_default().push(record);
    }

    by_key
        .into_values()
        .filter_map(|mut history| {
            history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
            let mut history = history.into_iter();
            let latest = history.next()?;
            let previous = latest.previous_value.or_else(|| history.next().map(|r| r.value));
            Some(snapshot(latest, previous))
        })
        .collect()
}

fn snapshot(latest: KpiRecord, previous: Option<f64>) -> KpiSnapshot {
    let change = previous.map(|p| round2(latest.value - p));
    let change_pct = previous
        .filter(|p| *p != 0.0)
        .map(|p| round2((latest.value - p) / p.abs() * 100.0));

    KpiSnapshot {
        key: latest.key,
        label: latest.label,
        account_id: latest.account_id,
        value: latest.value,
        previous_value: previous,
        change,
        change_pct,
        unit: latest.unit,
        recorded_at: latest.recorded_at,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortView {
    pub account_id: AccountId,
    pub cohort_month: NaiveDate,
    pub initial_customers: i64,
    pub retained: Vec<i64>,
    /// Percent of the initial cohort retained at each period.
    pub retention_rates: Vec<f64>,
}

impl From<CohortRecord> for CohortView {
    fn from(record: CohortRecord) -> Self {
        let initial = record.initial_customers as f64;
        let retention_rates = record
            .retained
            .iter()
            .map(|count| percentage(*count as f64, initial))
            .collect();

        Self {
            account_id: record.account_id,
            cohort_month: record.cohort_month,
            initial_customers: record.initial_customers,
            retained: record.retained,
            retention_rates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn kpi(key: &str, value: f64, previous: Option<f64>, day: u32) -> KpiRecord {
        KpiRecord {
            id: Uuid::new_v4(),
            account_id: AccountId(Uuid::nil()),
            key: key.to_string(),
            label: key.to_uppercase(),
            value,
            previous_value: previous,
            unit: None,
            recorded_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn picks_latest_and_compares_with_prior_row() {
        let snapshots = latest_kpis(vec![
            kpi("nrr", 100.0, None, 1),
            kpi("nrr", 110.0, None, 2),
            kpi("churn", 4.0, Some(5.0), 3),
        ]);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].key, "churn");
        assert_eq!(snapshots[0].change, Some(-1.0));
        assert_eq!(snapshots[0].change_pct, Some(-20.0));

        assert_eq!(snapshots[1].key, "nrr");
        assert_eq!(snapshots[1].value, 110.0);
        assert_eq!(snapshots[1].previous_value, Some(100.0));
        assert_eq!(snapshots[1].change_pct, Some(10.0));
    }

    #[test]
    fn single_reading_has_no_change() {
        let snapshots = latest_kpis(vec![kpi("mrr", 5000.0, None, 1)]);
        assert_eq!(snapshots[0].change, None);
        assert_eq!(snapshots[0].change_pct, None);
    }

    #[test]
    fn zero_baseline_has_no_percentage() {
        let snapshots = latest_kpis(vec![kpi("expansions", 3.0, Some(0.0), 1)]);
        assert_eq!(snapshots[0].change, Some(3.0));
        assert_eq!(snapshots[0].change_pct, None);
    }

    #[test]
    fn cohort_rates_are_percentages_of_initial() {
        let view = CohortView::from(CohortRecord {
            id: Uuid::new_v4(),
            account_id: AccountId(Uuid::nil()),
            cohort_month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            initial_customers: 40,
            retained: vec![40, 36, 30],
        });
        assert_eq!(view.retention_rates, vec![100.0, 90.0, 75.0]);

        let empty = CohortView::from(CohortRecord {
            id: Uuid::new_v4(),
            account_id: AccountId(Uuid::nil()),
            cohort_month: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            initial_customers: 0,
            retained: vec![0],
        });
        assert_eq!(empty.retention_rates, vec![0.0]);
    }
}
