//! Account scoping.
//!
//! Every domain query goes through an [`AccountScope`], which pins the
//! caller's resolved account id as the first condition of the filter and
//! re-checks the rows that come back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::membership::{AccountMember, MEMBERSHIP_TABLE};
use crate::database::{DatabaseError, SessionClient};
use crate::filter::{Filter, FilterData};

pub const ACCOUNT_COLUMN: &str = "account_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A row that belongs to exactly one account.
pub trait AccountOwned {
    const TABLE: &'static str;

    fn account_id(&self) -> AccountId;
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("No account is associated with user {0}")]
    NoAccount(Uuid),

    #[error("Account lookup requires an authenticated session")]
    Anonymous,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Look up the caller's account through their own session client.
///
/// A user with several memberships resolves to the oldest one.
pub async fn resolve_account_id(client: &SessionClient) -> Result<AccountId, AccountError> {
    let user_id = client.user_id().ok_or(AccountError::Anonymous)?;

    let mut filter = Filter::new(MEMBERSHIP_TABLE).map_err(DatabaseError::from)?;
    filter
        .where_clause(json!({ "user_id": user_id }))
        .and_then(|f| f.order(json!("created_at asc")))
        .and_then(|f| f.limit(1, None))
        .map_err(DatabaseError::from)?;

    let members: Vec<AccountMember> = client.select_as(&filter).await?;
    match members.into_iter().next() {
        Some(member) => {
            tracing::debug!(user_id = %user_id, account_id = %member.account_id, "Resolved account");
            Ok(member.account_id)
        }
        None => Err(AccountError::NoAccount(user_id)),
    }
}

/// Session client pinned to one account.
#[derive(Clone)]
pub struct AccountScope {
    account_id: AccountId,
    client: SessionClient,
}

impl AccountScope {
    pub fn new(account_id: AccountId, client: SessionClient) -> Self {
        Self { account_id, client }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Build a filter for `table` with the account condition injected.
    pub fn filter(&self, table: &str, data: FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(table)?;
        filter.assign(data)?;
        filter.scope(ACCOUNT_COLUMN, json!(self.account_id))?;
        Ok(filter)
    }

    pub async fn select<T>(&self, data: FilterData) -> Result<Vec<T>, DatabaseError>
    where
        T: AccountOwned + DeserializeOwned,
    {
        let filter = self.filter(T::TABLE, data)?;
        let rows: Vec<T> = self.client.select_as(&filter).await?;
        Ok(self.retain_owned(rows))
    }

    pub async fn select_one<T>(&self, mut data: FilterData) -> Result<Option<T>, DatabaseError>
    where
        T: AccountOwned + DeserializeOwned,
    {
        data.limit = Some(1);
        data.offset = None;
        Ok(self.select(data).await?.into_iter().next())
    }

    fn retain_owned<T: AccountOwned>(&self, rows: Vec<T>) -> Vec<T> {
        let total = rows.len();
        let kept: Vec<T> = rows
            .into_iter()
            .filter(|row| row.account_id() == self.account_id)
            .collect();

        if kept.len() != total {
            tracing::error!(
                table = T::TABLE,
                account_id = %self.account_id,
                dropped = total - kept.len(),
                "Dropped rows belonging to another account"
            );
        }
        kept
    }
}
