use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub account_id: AccountId,
    pub user_id: Uuid,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default = "default_true")]
    pub weekly_digest: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// `None` when these are defaults that were never stored.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_theme() -> String {
    "system".to_string()
}

fn default_true() -> bool {
    true
}

impl UserSettings {
    pub fn defaults(account_id: AccountId, user_id: Uuid) -> Self {
        Self {
            account_id,
            user_id,
            timezone: default_timezone(),
            locale: default_locale(),
            email_notifications: true,
            weekly_digest: true,
            theme: default_theme(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_rows_fill_defaults() {
        let account_id = AccountId(Uuid::new_v4());
        let user_id = Uuid::new_v4();
        let row = json!({
            "account_id": account_id,
            "user_id": user_id,
            "theme": "dark",
            "updated_at": "2024-02-01T00:00:00Z"
        });

        let settings: UserSettings = serde_json::from_value(row).unwrap();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.timezone, "UTC");
        assert!(settings.email_notifications);
        assert!(settings.updated_at.is_some());
    }
}
