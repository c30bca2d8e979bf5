// src/connect/stripe.rs — Stripe REST client (accounts + account links)
//
// Stripe's API is form-encoded; responses are parsed as loose JSON rather
// than a full schema, we only need four fields of the account object.

use async_trait::async_trait;
use std::time::Duration;

use super::{ConnectProvider, ProviderAccount};
use crate::infra::errors::LeafmarketError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct StripeClient {
    secret_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: api_base.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.trim_end_matches('/'))
    }

    fn upstream(message: impl Into<String>) -> LeafmarketError {
        LeafmarketError::Upstream {
            service: "stripe".into(),
            message: message.into(),
        }
    }

    async fn send_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<serde_json::Value, LeafmarketError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::upstream(e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn send_get(&self, path: &str) -> Result<serde_json::Value, LeafmarketError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.secret_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Self::upstream(e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn parse_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, LeafmarketError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Stripe wraps errors as {"error": {"message": ...}}.
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(Self::upstream(format!("HTTP {status}: {message}")));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| Self::upstream(format!("Failed to parse response: {e}")))
    }

    fn account_from_value(value: &serde_json::Value) -> Result<ProviderAccount, LeafmarketError> {
        let id = value["id"]
            .as_str()
            .ok_or_else(|| Self::upstream("account response missing 'id'"))?;
        Ok(ProviderAccount {
            id: id.to_string(),
            charges_enabled: value["charges_enabled"].as_bool().unwrap_or(false),
            payouts_enabled: value["payouts_enabled"].as_bool().unwrap_or(false),
            details_submitted: value["details_submitted"].as_bool().unwrap_or(false),
        })
    }
}

#[async_trait]
impl ConnectProvider for StripeClient {
    async fn create_account(
        &self,
        country: &str,
        email: Option<String>,
    ) -> Result<ProviderAccount, LeafmarketError> {
        let mut form = vec![
            ("type", "express"),
            ("country", country),
            ("business_type", "individual"),
            ("capabilities[card_payments][requested]", "true"),
            ("capabilities[transfers][requested]", "true"),
        ];
        if let Some(ref email) = email {
            form.push(("email", email.as_str()));
        }

        let value = self.send_form("/v1/accounts", &form).await?;
        Self::account_from_value(&value)
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<ProviderAccount, LeafmarketError> {
        let value = self.send_get(&format!("/v1/accounts/{account_id}")).await?;
        Self::account_from_value(&value)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<String, LeafmarketError> {
        let form = [
            ("account", account_id),
            ("refresh_url", refresh_url),
            ("return_url", return_url),
            ("type", "account_onboarding"),
        ];

        let value = self.send_form("/v1/account_links", &form).await?;
        value["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Self::upstream("account link response missing 'url'"))
    }
}
