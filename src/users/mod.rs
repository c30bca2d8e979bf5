// src/users/mod.rs — External user-record document store

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infra::errors::LeafmarketError;

pub use http::HttpUserStore;
pub use memory::MemoryUserStore;

/// Seller onboarding state machine: none → pending → submitted → active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Submitted,
    Active,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Submitted => "submitted",
            AccountStatus::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "stripeAccountId")]
    pub stripe_account_id: Option<String>,
    #[serde(default, rename = "stripeAccountStatus")]
    pub stripe_account_status: Option<AccountStatus>,
}

/// Document-store seam. Records are never created or deleted here; the
/// marketplace owns the collection, this service only mutates the Stripe
/// fields.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when no record exists for the uid.
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, LeafmarketError>;

    async fn set_stripe_account(
        &self,
        uid: &str,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError>;

    async fn set_account_status(
        &self,
        uid: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError>;
}
