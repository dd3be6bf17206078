use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

pub const MEMBERSHIP_TABLE: &str = "account_members";

/// Links a user to an account. Not account-scoped itself: it is what the
/// scope is resolved from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMember {
    pub user_id: Uuid,
    pub account_id: AccountId,
    #[serde(default)]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}
