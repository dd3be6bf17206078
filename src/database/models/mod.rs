pub mod cohort;
pub mod customer;
pub mod guide;
pub mod integration;
pub mod kpi;
pub mod membership;
pub mod report;
pub mod segment;
pub mod settings;

pub use cohort::CohortRecord;
pub use customer::{Customer, CustomerStatus};
pub use guide::{Guide, GuideStatus};
pub use integration::{Integration, IntegrationStatus};
pub use kpi::KpiRecord;
pub use membership::AccountMember;
pub use report::Report;
pub use segment::SegmentRecord;
pub use settings::UserSettings;

use crate::account::{AccountId, AccountOwned};

macro_rules! account_owned {
    ($($model:ty => $table:literal),* $(,)?) => {
        $(
            impl AccountOwned for $model {
                const TABLE: &'static str = $table;

                fn account_id(&self) -> AccountId {
                    self.account_id
                }
            }
        )*
    };
}

account_owned! {
    Customer => "customers",
    Guide => "guides",
    Integration => "integrations",
    KpiRecord => "metric_kpis",
    CohortRecord => "metric_cohorts",
    SegmentRecord => "metric_segments",
    Report => "reports",
    UserSettings => "user_settings",
}
