//! Bling OAuth token lifecycle: expiry decision, refresh exchange, and
//! write-through persistence. One manager instance per token store; refresh
//! calls from concurrent managers against the same file would race.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::domain::model::{TokenRecord, DEFAULT_EXPIRES_IN};
use crate::domain::ports::TokenStore;
use crate::utils::error::{AutomationError, Result};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

pub struct TokenManager<S: TokenStore> {
    store: S,
    http: reqwest::Client,
    oauth_url: String,
    refresh_margin_seconds: i64,
    proceed_on_refresh_failure: bool,
    record: RwLock<TokenRecord>,
}

impl<S: TokenStore> TokenManager<S> {
    /// Load the persisted credential and build the manager. A missing or
    /// malformed token file is fatal here; nothing downstream can run
    /// without a credential record.
    pub async fn initialize(store: S, config: &AppConfig) -> Result<Self> {
        let record = store.load().await?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_seconds))
            .build()?;

        Ok(Self {
            store,
            http,
            oauth_url: config.api.oauth_url.clone(),
            refresh_margin_seconds: config.policy.refresh_margin_seconds,
            proceed_on_refresh_failure: config.policy.proceed_on_refresh_failure,
            record: RwLock::new(record),
        })
    }

    /// Expiry check against an explicit clock. A record without an issuance
    /// timestamp is always expired; otherwise the token dies `margin_seconds`
    /// early so an in-flight invoicing call cannot outlive it.
    pub fn is_expired_at(record: &TokenRecord, now: DateTime<Utc>, margin_seconds: i64) -> bool {
        match record.issued_at {
            None => true,
            Some(issued_at) => {
                now >= issued_at + ChronoDuration::seconds(record.expires_in - margin_seconds)
            }
        }
    }

    pub async fn is_expired(&self) -> bool {
        let record = self.record.read().await;
        Self::is_expired_at(&record, Utc::now(), self.refresh_margin_seconds)
    }

    /// Exchange the refresh token for a new access token and persist the
    /// updated record. On any failure the in-memory record stays untouched.
    pub async fn refresh(&self) -> Result<()> {
        let mut record = self.record.write().await;

        if record.refresh_token.is_empty() {
            return Err(AutomationError::TokenRefresh {
                message: "no refresh token available".to_string(),
            });
        }

        tracing::info!("🔄 Renewing access token...");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", record.refresh_token.as_str()),
        ];

        let response = self
            .http
            .post(&self.oauth_url)
            .basic_auth(&record.client_id, Some(&record.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| AutomationError::TokenRefresh {
                message: e.to_string(),
            })?;

        if response.status().as_u16() != 200 {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AutomationError::TokenRefresh {
                message: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            });
        }

        let payload: RefreshResponse =
            response
                .json()
                .await
                .map_err(|e| AutomationError::TokenRefresh {
                    message: format!("invalid token response: {}", e),
                })?;

        record.access_token = payload.access_token;
        if let Some(refresh_token) = payload.refresh_token {
            record.refresh_token = refresh_token;
        }
        record.expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        record.issued_at = Some(Utc::now());

        self.store.save(&record).await?;

        tracing::info!("✅ Access token renewed");
        Ok(())
    }

    /// Return a usable access token, refreshing first when expired. With
    /// `proceed_on_refresh_failure` (the default) a failed refresh only
    /// logs a warning and the possibly stale token is handed out anyway,
    /// leaving the final accept/reject to the invoicing endpoint.
    pub async fn access_token(&self) -> Result<String> {
        if self.is_expired().await {
            tracing::warn!("⚠️ Access token expired, attempting refresh");
            if let Err(e) = self.refresh().await {
                if self.proceed_on_refresh_failure {
                    tracing::warn!("⚠️ {} - proceeding with the current token", e);
                } else {
                    return Err(e);
                }
            }
        }

        Ok(self.record.read().await.access_token.clone())
    }

    /// Snapshot of the current credential record.
    pub async fn current(&self) -> TokenRecord {
        self.record.read().await.clone()
    }
}
