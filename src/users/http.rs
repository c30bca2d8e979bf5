// src/users/http.rs — User records over the document store's REST surface
//
// GET  {base}/users/{uid}   → 200 with the record JSON, 404 when absent
// PATCH {base}/users/{uid}  → partial update with the changed fields

use async_trait::async_trait;
use std::time::Duration;

use super::{AccountStatus, UserRecord, UserStore};
use crate::infra::errors::LeafmarketError;

pub struct HttpUserStore {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HttpUserStore {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token,
            client: reqwest::Client::new(),
        }
    }

    fn record_url(&self, uid: &str) -> String {
        format!("{}/users/{uid}", self.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn patch(&self, uid: &str, body: serde_json::Value) -> Result<(), LeafmarketError> {
        let response = self
            .authorize(self.client.patch(self.record_url(uid)))
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| LeafmarketError::Upstream {
                service: "users".into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LeafmarketError::NotFound("User not found".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeafmarketError::Upstream {
                service: "users".into(),
                message: format!("HTTP {status}: {body}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for HttpUserStore {
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, LeafmarketError> {
        let response = self
            .authorize(self.client.get(self.record_url(uid)))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| LeafmarketError::Upstream {
                service: "users".into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeafmarketError::Upstream {
                service: "users".into(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let record = response
            .json::<UserRecord>()
            .await
            .map_err(|e| LeafmarketError::Upstream {
                service: "users".into(),
                message: format!("Failed to parse user record: {e}"),
            })?;
        Ok(Some(record))
    }

    async fn set_stripe_account(
        &self,
        uid: &str,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError> {
        self.patch(
            uid,
            serde_json::json!({
                "stripeAccountId": account_id,
                "stripeAccountStatus": status.as_str(),
            }),
        )
        .await
    }

    async fn set_account_status(
        &self,
        uid: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError> {
        self.patch(
            uid,
            serde_json::json!({ "stripeAccountStatus": status.as_str() }),
        )
        .await
    }
}
