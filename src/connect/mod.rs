// src/connect/mod.rs — Stripe Connect seller onboarding

pub mod stripe;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::infra::errors::LeafmarketError;
use crate::users::{AccountStatus, UserStore};

pub use stripe::StripeClient;

/// Connected-account snapshot as reported by the payments provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderAccount {
    pub id: String,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub details_submitted: bool,
}

/// Payments-provider seam: account creation, capability lookup, and
/// onboarding-link minting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectProvider: Send + Sync {
    async fn create_account(
        &self,
        country: &str,
        email: Option<String>,
    ) -> Result<ProviderAccount, LeafmarketError>;

    async fn retrieve_account(&self, account_id: &str) -> Result<ProviderAccount, LeafmarketError>;

    /// Mints a fresh short-lived hosted onboarding URL. Never idempotent:
    /// every call returns a new link.
    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, LeafmarketError>;
}

#[derive(Debug, Serialize)]
pub struct CreateAccountOutcome {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "accountLinkUrl")]
    pub account_link_url: String,
}

pub struct ConnectService {
    provider: Arc<dyn ConnectProvider>,
    users: Arc<dyn UserStore>,
}

impl ConnectService {
    pub fn new(provider: Arc<dyn ConnectProvider>, users: Arc<dyn UserStore>) -> Self {
        Self { provider, users }
    }

    fn refresh_url(base_url: &str, uid: &str) -> String {
        format!("{base_url}/stripe-connect-refresh?userId={uid}")
    }

    fn return_url(base_url: &str, uid: &str) -> String {
        format!("{base_url}/stripe-connect-success?userId={uid}")
    }

    async fn mint_link(
        &self,
        account_id: &str,
        base_url: &str,
        uid: &str,
    ) -> Result<String, LeafmarketError> {
        self.provider
            .create_account_link(
                account_id,
                &Self::refresh_url(base_url, uid),
                &Self::return_url(base_url, uid),
            )
            .await
    }

    /// Create a provider account for the caller if none exists, persist it
    /// as `pending`, and mint an onboarding link. With an existing account
    /// only a fresh link is minted — account creation is idempotent, link
    /// generation is not.
    pub async fn create_account(
        &self,
        uid: &str,
        caller_email: Option<&str>,
        country: Option<&str>,
        base_url: &str,
    ) -> Result<CreateAccountOutcome, LeafmarketError> {
        let record = self
            .users
            .get(uid)
            .await?
            .ok_or_else(|| LeafmarketError::NotFound("User not found".into()))?;

        if let Some(account_id) = record.stripe_account_id {
            let url = self.mint_link(&account_id, base_url, uid).await?;
            return Ok(CreateAccountOutcome {
                account_id,
                account_link_url: url,
            });
        }

        let email = record
            .email
            .clone()
            .or_else(|| caller_email.map(str::to_string));
        let account = self
            .provider
            .create_account(country.unwrap_or("US"), email)
            .await?;

        self.users
            .set_stripe_account(uid, &account.id, AccountStatus::Pending)
            .await?;
        tracing::info!("Created connect account '{}' for user '{uid}'", account.id);

        let url = self.mint_link(&account.id, base_url, uid).await?;
        Ok(CreateAccountOutcome {
            account_id: account.id,
            account_link_url: url,
        })
    }

    /// Query current capabilities and persist the derived status.
    pub async fn update_account_status(&self, uid: &str) -> Result<AccountStatus, LeafmarketError> {
        let record = self
            .users
            .get(uid)
            .await?
            .ok_or_else(|| LeafmarketError::NotFound("User not found".into()))?;
        let account_id = record.stripe_account_id.ok_or_else(|| {
            LeafmarketError::NotFound("No Stripe account found for this user".into())
        })?;

        let account = self.provider.retrieve_account(&account_id).await?;
        let status = derive_status(&account);

        self.users.set_account_status(uid, status).await?;
        tracing::info!("User '{uid}' connect status is now '{}'", status.as_str());
        Ok(status)
    }

    /// Mint a fresh onboarding link for an existing account.
    pub async fn refresh_account_link(
        &self,
        uid: &str,
        base_url: &str,
    ) -> Result<String, LeafmarketError> {
        let record = self
            .users
            .get(uid)
            .await?
            .ok_or_else(|| LeafmarketError::NotFound("User not found".into()))?;
        let account_id = record.stripe_account_id.ok_or_else(|| {
            LeafmarketError::NotFound("No Stripe account found for this user".into())
        })?;

        self.mint_link(&account_id, base_url, uid).await
    }
}

/// Fixed priority: fully capable → active, onboarding details submitted →
/// submitted, otherwise still pending.
pub fn derive_status(account: &ProviderAccount) -> AccountStatus {
    if account.charges_enabled && account.payouts_enabled {
        AccountStatus::Active
    } else if account.details_submitted {
        AccountStatus::Submitted
    } else {
        AccountStatus::Pending
    }
}
